//! Immutable view of the world for request handling.
//!
//! A request waits for its document to finish compiling, then captures a
//! snapshot and answers from it without holding any lock. Analyses are
//! shared, so capturing is cheap.

use bblang_core::{CompilerResult, FileSourceProvider, FileUri, ParserResult, SourceProvider, Token};
use std::collections::HashMap;
use std::sync::Arc;

use crate::documents::{buffer_query, Analysis, DocumentStore};

/// What a request sees of the server state.
#[derive(Debug, Clone)]
pub struct Snapshot {
    uri: FileUri,
    version: Option<i32>,
    analysis: Arc<Analysis>,
    open: HashMap<FileUri, Arc<Analysis>>,
}

impl Snapshot {
    /// A snapshot of a single analysis with no other open documents.
    pub fn new(uri: FileUri, version: Option<i32>, analysis: Arc<Analysis>) -> Self {
        Self {
            uri,
            version,
            analysis,
            open: HashMap::new(),
        }
    }

    /// Capture the state of `uri` and of every other open document.
    pub fn capture(store: &DocumentStore, uri: &FileUri) -> Option<Self> {
        let document = store.try_get(uri)?;
        let open = store
            .documents()
            .map(|document| (document.uri().clone(), document.analysis()))
            .collect();
        Some(Self {
            uri: uri.clone(),
            version: document.version(),
            analysis: document.analysis(),
            open,
        })
    }

    /// The document the request is about.
    pub const fn uri(&self) -> &FileUri {
        &self.uri
    }

    /// Editor version of the document when the snapshot was taken.
    pub const fn version(&self) -> Option<i32> {
        self.version
    }

    /// The document's analysis.
    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    /// Tokens of the document.
    pub fn tokens(&self) -> &[Token] {
        &self.analysis.tokens
    }

    /// Syntax tree of the document.
    pub fn ast(&self) -> &ParserResult {
        &self.analysis.ast
    }

    /// The compilation the document belongs to.
    pub fn result(&self) -> &CompilerResult {
        &self.analysis.result
    }

    /// Tokens of any file: from its open document when there is one,
    /// otherwise from the compilation.
    pub fn tokens_of(&self, file: &FileUri) -> Option<&[Token]> {
        if file == &self.uri {
            return Some(self.tokens());
        }
        if let Some(analysis) = self.open.get(file) {
            if !analysis.tokens.is_empty() {
                return Some(&analysis.tokens);
            }
        }
        self.result().file(file).map(|parsed| parsed.tokens.as_slice())
    }

    /// Every URI a `using` path could refer to from this document, across
    /// open buffers and the directories the compilation searched.
    pub fn using_candidates(&self, requested: &str) -> Vec<FileUri> {
        let files = FileSourceProvider::new(self.analysis.extra_directories.clone());
        let mut candidates = buffer_query(requested, Some(&self.uri));
        for candidate in files.get_query(requested, Some(&self.uri)) {
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
        candidates
    }
}
