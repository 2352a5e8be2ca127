//! Registry of open documents and notebooks.
//!
//! The store is the single source of truth for what the editor has open. It
//! also answers the compiler's `using` lookups from in-memory buffers, so
//! unsaved edits are compiled instead of whatever is on disk.

use bblang_core::keywords::{LANGUAGE_ID, SOURCE_EXTENSION};
use bblang_core::{
    with_source_extension, CompilerResult, FileUri, ParserResult, SourceProvider,
    SourceProviderResult, Token, VersionProvider,
};
use lsp_types::TextDocumentContentChangeEvent;
use parking_lot::RwLock;
use ropey::Rope;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::DocumentError;
use crate::notebook::Notebook;

/// Languages the server can host documents for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// BBLang source.
    BBLang,
}

impl Language {
    /// Select the language for a language id or file extension.
    pub fn from_id(language_id: &str) -> Result<Self, DocumentError> {
        if language_id == LANGUAGE_ID || language_id == SOURCE_EXTENSION {
            Ok(Self::BBLang)
        } else {
            Err(DocumentError::UnknownLanguage {
                language_id: language_id.to_string(),
            })
        }
    }

    /// The language id editors use.
    pub const fn id(self) -> &'static str {
        match self {
            Self::BBLang => LANGUAGE_ID,
        }
    }
}

/// The outcome of the most recent compilation of a document.
#[derive(Debug, Default)]
pub struct Analysis {
    /// Document version the compilation started from.
    pub version: Option<i32>,
    /// Tokens of this document.
    pub tokens: Vec<Token>,
    /// Syntax tree of this document.
    pub ast: ParserResult,
    /// Everything the compilation produced.
    pub result: Arc<CompilerResult>,
    /// Search directories the compilation used for `using` paths.
    pub extra_directories: Vec<PathBuf>,
}

/// An open document.
#[derive(Debug)]
pub struct Document {
    uri: FileUri,
    language: Language,
    content: Option<Rope>,
    version: Option<i32>,
    analysis: Arc<Analysis>,
}

impl Document {
    /// Create a document, optionally with its text.
    pub fn new(uri: FileUri, language: Language, content: Option<&str>) -> Self {
        Self {
            uri,
            language,
            content: content.map(Rope::from_str),
            version: None,
            analysis: Arc::new(Analysis::default()),
        }
    }

    /// The document URI.
    pub const fn uri(&self) -> &FileUri {
        &self.uri
    }

    /// The document language.
    pub const fn language(&self) -> Language {
        self.language
    }

    /// The last version the editor reported.
    pub const fn version(&self) -> Option<i32> {
        self.version
    }

    /// Whether the editor sent the text of this document.
    pub const fn has_content(&self) -> bool {
        self.content.is_some()
    }

    /// The document text.
    pub fn text(&self) -> Option<String> {
        self.content.as_ref().map(Rope::to_string)
    }

    /// The document text as a rope.
    pub const fn rope(&self) -> Option<&Rope> {
        self.content.as_ref()
    }

    /// The most recent analysis.
    pub fn analysis(&self) -> Arc<Analysis> {
        Arc::clone(&self.analysis)
    }

    /// Replace the analysis unless it was made from an older version than
    /// the one already stored. Returns whether it was stored.
    pub fn store_analysis(&mut self, analysis: Analysis) -> bool {
        if analysis.version < self.analysis.version {
            tracing::debug!(
                "Discarding stale analysis of {} (v{:?} < v{:?})",
                self.uri,
                analysis.version,
                self.analysis.version
            );
            return false;
        }
        self.analysis = Arc::new(analysis);
        true
    }

    /// The editor opened the document.
    pub fn on_opened(&mut self, text: &str, version: i32) {
        tracing::debug!("[Buffer] Opened {} (v{})", self.uri, version);
        self.content = Some(Rope::from_str(text));
        self.version = Some(version);
    }

    /// The editor changed the document.
    pub fn on_changed(&mut self, changes: &[TextDocumentContentChangeEvent], version: i32) {
        tracing::debug!(
            "[Buffer] Changed {} (v{}, {} edits)",
            self.uri,
            version,
            changes.len()
        );
        let rope = self.content.get_or_insert_with(Rope::new);
        for change in changes {
            apply_change(rope, change);
        }
        self.version = Some(version);
    }

    /// The editor saved the document, optionally sending its text.
    pub fn on_saved(&mut self, text: Option<&str>) {
        tracing::debug!("[Buffer] Saved {}", self.uri);
        if let Some(text) = text {
            self.content = Some(Rope::from_str(text));
        }
    }
}

/// Apply one content change to a rope.
fn apply_change(rope: &mut Rope, change: &TextDocumentContentChangeEvent) {
    match change.range {
        None => *rope = Rope::from_str(&change.text),
        Some(range) => {
            let start = position_to_char(rope, range.start);
            let end = position_to_char(rope, range.end).max(start);
            rope.remove(start..end);
            rope.insert(start, &change.text);
        }
    }
}

/// Convert a protocol position (UTF-16 columns) to a char index, clamped to
/// the end of its line.
fn position_to_char(rope: &Rope, position: lsp_types::Position) -> usize {
    let line = position.line as usize;
    if line >= rope.len_lines() {
        return rope.len_chars();
    }
    let line_start = rope.line_to_char(line);
    let line_end = if line + 1 < rope.len_lines() {
        rope.line_to_char(line + 1)
    } else {
        rope.len_chars()
    };
    let start_unit = rope.char_to_utf16_cu(line_start);
    let end_unit = rope.char_to_utf16_cu(line_end);
    let target = (start_unit + position.character as usize).min(end_unit);
    rope.utf16_cu_to_char(target)
}

/// All open documents and notebooks.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
    pub(crate) notebooks: Vec<Notebook>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open documents in registration order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    /// Number of open documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no document is open.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Look a document up by exact URI.
    pub fn try_get(&self, uri: &FileUri) -> Option<&Document> {
        self.documents.iter().find(|document| &document.uri == uri)
    }

    /// Look a document up by exact URI for mutation.
    pub fn try_get_mut(&mut self, uri: &FileUri) -> Option<&mut Document> {
        self.documents.iter_mut().find(|document| &document.uri == uri)
    }

    /// Return the document for `uri`, registering it first if needed. The
    /// language is taken from the URI's extension.
    ///
    /// A `file:` document without `content` is read from disk.
    pub fn get_or_create(
        &mut self,
        uri: &FileUri,
        content: Option<&str>,
    ) -> Result<&mut Document, DocumentError> {
        let extension = uri.extension().unwrap_or_default();
        self.get_or_create_with_language(uri, &extension, content)
    }

    /// Like [`get_or_create`](Self::get_or_create), with an explicit
    /// language id for URIs whose extension does not name one.
    pub fn get_or_create_with_language(
        &mut self,
        uri: &FileUri,
        language_id: &str,
        content: Option<&str>,
    ) -> Result<&mut Document, DocumentError> {
        self.remove_duplicates();

        if let Some(index) = self.position(uri) {
            return Ok(&mut self.documents[index]);
        }

        tracing::debug!("[Docs] Register ({})", uri);

        let loaded;
        let content = match (content, uri.to_file_path()) {
            (Some(content), _) => Some(content),
            (None, Some(path)) => {
                if !path.is_file() {
                    return Err(DocumentError::FileNotFound { path });
                }
                loaded = std::fs::read_to_string(&path)
                    .map_err(|source| DocumentError::Io { path, source })?;
                Some(loaded.as_str())
            }
            (None, None) => None,
        };

        let language = Language::from_id(language_id)?;
        self.documents
            .push(Document::new(uri.clone(), language, content));
        let index = self.documents.len() - 1;
        Ok(&mut self.documents[index])
    }

    fn position(&self, uri: &FileUri) -> Option<usize> {
        self.documents
            .iter()
            .position(|document| &document.uri == uri)
    }

    /// Remove every document and notebook registered under `uri`.
    /// Returns whether anything was removed.
    pub fn remove(&mut self, uri: &FileUri) -> bool {
        tracing::debug!("[Docs] Unregister ({})", uri);
        let before = self.documents.len() + self.notebooks.len();
        self.documents.retain(|document| &document.uri != uri);
        self.notebooks.retain(|notebook| notebook.uri() != uri);
        before != self.documents.len() + self.notebooks.len()
    }

    /// Collapse entries that share a URI, keeping the one registered last.
    /// Returns how many entries were dropped.
    pub fn remove_duplicates(&mut self) -> usize {
        let removed = retain_last_by(&mut self.documents, |document| &document.uri)
            + retain_last_by(&mut self.notebooks, Notebook::uri);
        if removed > 0 {
            tracing::debug!("[Docs] Removed {} duplicate entries", removed);
        }
        removed
    }

    /// URIs `requested` could refer to when written in `current_file`.
    pub fn get_query(&self, requested: &str, current_file: Option<&FileUri>) -> Vec<FileUri> {
        buffer_query(requested, current_file)
    }

    /// Answer a `using` lookup from open buffers.
    pub fn try_load(&self, requested: &str, current_file: Option<&FileUri>) -> SourceProviderResult {
        let candidates = self.get_query(requested, current_file);

        for candidate in &candidates {
            let Some(document) = self.try_get(candidate) else {
                continue;
            };
            return match document.text() {
                Some(content) => {
                    tracing::debug!(
                        "[Compiler] Document provided by client ({} bytes) ({})",
                        content.len(),
                        candidate
                    );
                    SourceProviderResult::Success {
                        uri: candidate.clone(),
                        content,
                    }
                }
                None => {
                    tracing::debug!("[Compiler] Document provided by client (no content) ({})", candidate);
                    SourceProviderResult::Error {
                        uri: candidate.clone(),
                        message: "Document not loaded".to_string(),
                    }
                }
            };
        }

        match candidates.last() {
            Some(last) => SourceProviderResult::NotFound {
                uri: Some(last.clone()),
            },
            None => SourceProviderResult::NextHandler,
        }
    }

    /// Version of an open document that has content.
    pub fn try_get_version(&self, uri: &FileUri) -> Option<i32> {
        self.try_get(uri)
            .filter(|document| document.has_content())
            .and_then(Document::version)
    }
}

/// The path with the source extension, resolved against the current file.
/// Yields at most one candidate.
pub fn buffer_query(requested: &str, current_file: Option<&FileUri>) -> Vec<FileUri> {
    let requested = with_source_extension(requested);
    current_file
        .and_then(|current| current.join(&requested))
        .into_iter()
        .collect()
}

/// Drop earlier items whose key repeats a later one.
fn retain_last_by<T, K, F>(items: &mut Vec<T>, key: F) -> usize
where
    K: std::hash::Hash + Eq + ?Sized,
    F: Fn(&T) -> &K,
{
    let mut seen = HashSet::new();
    let keep: Vec<bool> = {
        let mut keep: Vec<bool> = items.iter().rev().map(|item| seen.insert(key(item))).collect();
        keep.reverse();
        keep
    };
    let before = items.len();
    let mut flags = keep.into_iter();
    items.retain(|_| flags.next().unwrap_or(true));
    before - items.len()
}

/// A [`DocumentStore`] shared with the compiler as a source and version
/// provider.
#[derive(Debug, Clone)]
pub struct SharedDocuments(pub Arc<RwLock<DocumentStore>>);

impl SourceProvider for SharedDocuments {
    fn try_load(&self, requested: &str, current_file: Option<&FileUri>) -> SourceProviderResult {
        self.0.read().try_load(requested, current_file)
    }

    fn get_query(&self, requested: &str, current_file: Option<&FileUri>) -> Vec<FileUri> {
        self.0.read().get_query(requested, current_file)
    }
}

impl VersionProvider for SharedDocuments {
    fn try_get_version(&self, uri: &FileUri) -> Option<i32> {
        self.0.read().try_get_version(uri)
    }
}
