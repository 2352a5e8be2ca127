//! The compile step run by a document's scheduler.
//!
//! One run reads what it needs from the [`DocumentStore`] under a short
//! lock, compiles on the blocking pool, stores the analysis and publishes
//! diagnostics for every file the compilation touched. Failures of the
//! pipeline itself are shown to the user and never reach the scheduler.

use bblang_core::{
    CompilationCache, Compiler, CompilerSettings, DiagnosticsCollection, FileSourceProvider,
    FileUri, OptimizationLevel, ParserResult, PreprocessorVariables, SourceProvider,
    TokenizerSettings, VersionProvider,
};
use lsp_types::MessageType;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::client::Client;
use crate::config::{self, ProjectConfig};
use crate::documents::{Analysis, Document, DocumentStore, SharedDocuments};
use crate::error::CompileError;
use crate::handlers::diagnostics::diagnostics_for_file;

/// Everything a compile needs, shared by all schedulers.
#[derive(Clone)]
pub struct CompileContext {
    /// Open documents.
    pub documents: Arc<RwLock<DocumentStore>>,
    /// Process-wide parse cache.
    pub cache: Arc<CompilationCache>,
    /// The compiler.
    pub compiler: Arc<dyn Compiler>,
    /// Where diagnostics and messages go.
    pub client: Client,
    /// Settings last sent by the client.
    pub client_settings: Arc<RwLock<serde_json::Value>>,
}

impl std::fmt::Debug for CompileContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileContext")
            .field("documents", &self.documents.read().len())
            .field("cache", &self.cache.len())
            .finish_non_exhaustive()
    }
}

/// What the compile reads from the store before letting go of the lock.
struct Job {
    uri: FileUri,
    version: i32,
    files: Vec<FileUri>,
    text: Option<String>,
    previous: Arc<Analysis>,
}

/// What the blocking part hands back.
struct Outcome {
    analysis: Analysis,
    diagnostics: DiagnosticsCollection,
    compiled_files: Vec<FileUri>,
}

/// Compile `uri` and publish the results. Returns the document version the
/// compile started from, which is what the scheduler records as compiled,
/// or `None` if the document is closed.
pub async fn compile_document(context: CompileContext, uri: FileUri) -> Option<i32> {
    let Some(job) = prepare(&context.documents.read(), &uri) else {
        tracing::debug!("Skipping compile of {}: document is closed", uri);
        return None;
    };
    let version = job.version;

    let project = config::discover(&job.files, &context.client_settings.read());
    let settings = compiler_settings(&context, &project);
    let compiler = Arc::clone(&context.compiler);

    let outcome =
        tokio::task::spawn_blocking(move || run(compiler.as_ref(), job, &settings, &project))
            .await;

    match outcome {
        Ok(outcome) => publish(&context, &uri, outcome),
        Err(e) => {
            let error = CompileError::from_join(e);
            tracing::error!("Compilation of {} failed: {}", uri, error);
            context.client.show_message(
                MessageType::ERROR,
                format!("BBLang {}: {}", error.kind(), error),
            );
        }
    }

    Some(version)
}

fn prepare(store: &DocumentStore, uri: &FileUri) -> Option<Job> {
    let document = store.try_get(uri)?;
    Some(Job {
        uri: uri.clone(),
        version: document.version().unwrap_or(0),
        files: store.documents().map(|d| d.uri().clone()).collect(),
        text: document.text(),
        previous: document.analysis(),
    })
}

/// Settings for one compile: everything on, no optimisation, open buffers
/// served before the filesystem.
pub fn compiler_settings(context: &CompileContext, project: &ProjectConfig) -> CompilerSettings {
    let documents = Arc::new(SharedDocuments(Arc::clone(&context.documents)));
    let providers: Vec<Arc<dyn SourceProvider>> = vec![
        documents.clone(),
        Arc::new(FileSourceProvider::new(project.extra_directories.clone())),
    ];
    let mut settings = CompilerSettings::new(Arc::clone(&context.cache));
    settings.optimizations = OptimizationLevel::None;
    settings.compile_everything = true;
    settings.preprocessor_variables = PreprocessorVariables::normal();
    settings.source_providers = providers;
    settings.additional_imports.clone_from(&project.additional_imports);
    settings.external_functions.clone_from(&project.external_functions);
    settings.external_constants.clone_from(&project.external_constants);
    settings.tokenizer = TokenizerSettings {
        tokenize_comments: true,
        tokenize_whitespaces: false,
    };
    let versions: Arc<dyn VersionProvider> = documents;
    settings.version_provider = Some(versions);
    settings
}

fn run(
    compiler: &dyn Compiler,
    job: Job,
    settings: &CompilerSettings,
    project: &ProjectConfig,
) -> Outcome {
    let mut diagnostics = DiagnosticsCollection::new();
    let previous = &job.previous;
    let uri = &job.uri;

    let keep_previous = |version: i32| Analysis {
        version: Some(version),
        tokens: previous.tokens.clone(),
        ast: previous.ast.clone(),
        result: Arc::clone(&previous.result),
        extra_directories: project.extra_directories.clone(),
    };

    if uri.is_file() {
        return match compiler.compile(&job.files, settings, &mut diagnostics) {
            Ok(result) => {
                let (tokens, ast) = match result.file(uri) {
                    Some(parsed) => (parsed.tokens.clone(), parsed.ast.clone()),
                    None => (previous.tokens.clone(), ParserResult::default()),
                };
                let ast = if ast.is_empty() { previous.ast.clone() } else { ast };
                let compiled_files = result
                    .files
                    .iter()
                    .map(|parsed| parsed.file.clone())
                    .collect();
                tracing::info!(
                    "Validated {} ({})",
                    uri,
                    if diagnostics.has_errors() { "failed" } else { "ok" }
                );
                Outcome {
                    analysis: Analysis {
                        version: Some(job.version),
                        tokens,
                        ast,
                        result: Arc::new(result),
                        extra_directories: project.extra_directories.clone(),
                    },
                    diagnostics,
                    compiled_files,
                }
            }
            Err(error) => {
                tracing::warn!("Compilation of {} aborted: {}", uri, error);
                let mut compiled_files = vec![uri.clone()];
                if let Some(file) = error.file.as_ref().filter(|file| *file != uri) {
                    compiled_files.push(file.clone());
                }
                diagnostics.add(error.into());
                Outcome {
                    analysis: keep_previous(job.version),
                    diagnostics,
                    compiled_files,
                }
            }
        };
    }

    let Some(text) = job.text.as_deref() else {
        return Outcome {
            analysis: keep_previous(job.version),
            diagnostics,
            compiled_files: Vec::new(),
        };
    };

    let tokens = compiler.tokenize(
        text,
        &mut diagnostics,
        &settings.preprocessor_variables,
        uri,
        &settings.tokenizer,
    );
    let ast = compiler.parse(&tokens, uri, &mut diagnostics);
    tracing::info!("Validated {} (fallback)", uri);
    Outcome {
        analysis: Analysis {
            version: Some(job.version),
            tokens,
            ast,
            result: Arc::clone(&previous.result),
            extra_directories: project.extra_directories.clone(),
        },
        diagnostics,
        compiled_files: vec![uri.clone()],
    }
}

fn publish(context: &CompileContext, uri: &FileUri, outcome: Outcome) {
    for diagnostic in outcome.diagnostics.without_context() {
        tracing::error!("{}", diagnostic.message);
    }

    let versions: Vec<Option<i32>> = {
        let mut store = context.documents.write();
        let stored = store
            .try_get_mut(uri)
            .is_some_and(|document| document.store_analysis(outcome.analysis));
        if !stored {
            return;
        }
        outcome
            .compiled_files
            .iter()
            .map(|file| store.try_get(file).and_then(Document::version))
            .collect()
    };

    for (file, version) in outcome.compiled_files.iter().zip(versions) {
        let diagnostics = diagnostics_for_file(outcome.diagnostics.diagnostics(), file);
        context.client.publish_diagnostics(file, diagnostics, version);
    }
}
