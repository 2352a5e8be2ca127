//! Where the compiler gets source text from.
//!
//! The compiler asks each [`SourceProvider`] in order to resolve a `using`
//! path. A provider either answers, or defers to the next one with
//! [`SourceProviderResult::NextHandler`].

use std::fs;
use std::path::PathBuf;

use crate::keywords::SOURCE_EXTENSION;
use crate::FileUri;

/// Outcome of asking a provider for a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceProviderResult {
    /// The file was found.
    Success {
        /// Resolved URI.
        uri: FileUri,
        /// File contents.
        content: String,
    },
    /// The file was found but could not be read.
    Error {
        /// Resolved URI.
        uri: FileUri,
        /// Why reading failed.
        message: String,
    },
    /// The provider is responsible for the path but the file does not exist.
    NotFound {
        /// Last URI that was tried.
        uri: Option<FileUri>,
    },
    /// The provider has nothing to say; ask the next one.
    NextHandler,
}

/// Resolves `using` paths to source text.
pub trait SourceProvider: Send + Sync {
    /// Load `requested` as seen from `current_file`.
    fn try_load(&self, requested: &str, current_file: Option<&FileUri>) -> SourceProviderResult;

    /// URIs `requested` could refer to, in the order they would be tried.
    fn get_query(&self, _requested: &str, _current_file: Option<&FileUri>) -> Vec<FileUri> {
        Vec::new()
    }
}

/// Reports the edit version of files the editor has open.
pub trait VersionProvider: Send + Sync {
    /// Version of `uri`, if it is open.
    fn try_get_version(&self, uri: &FileUri) -> Option<i32>;
}

/// Append the source extension unless `path` already has it.
pub fn with_source_extension(path: &str) -> String {
    let suffix = format!(".{SOURCE_EXTENSION}");
    if path.ends_with(&suffix) {
        path.to_string()
    } else {
        format!("{path}{suffix}")
    }
}

/// Loads source files from disk.
#[derive(Debug, Clone, Default)]
pub struct FileSourceProvider {
    extra_directories: Vec<PathBuf>,
}

impl FileSourceProvider {
    /// Create a provider that also searches `extra_directories`.
    pub fn new(extra_directories: Vec<PathBuf>) -> Self {
        Self { extra_directories }
    }

    /// Directories searched after the requesting file's own directory.
    pub fn extra_directories(&self) -> &[PathBuf] {
        &self.extra_directories
    }
}

impl SourceProvider for FileSourceProvider {
    fn get_query(&self, requested: &str, current_file: Option<&FileUri>) -> Vec<FileUri> {
        let path = with_source_extension(requested);
        let mut candidates = Vec::new();

        if PathBuf::from(&path).is_absolute() {
            candidates.push(FileUri::from_file_path(&PathBuf::from(&path)));
            return candidates;
        }

        if let Some(current) = current_file.filter(|uri| uri.is_file()) {
            if let Some(uri) = current.join(&path) {
                candidates.push(uri);
            }
        }

        for directory in &self.extra_directories {
            candidates.push(FileUri::from_file_path(&directory.join(&path)));
        }

        candidates
    }

    fn try_load(&self, requested: &str, current_file: Option<&FileUri>) -> SourceProviderResult {
        let candidates = self.get_query(requested, current_file);
        if candidates.is_empty() {
            return SourceProviderResult::NextHandler;
        }

        for uri in &candidates {
            let Some(path) = uri.to_file_path() else {
                continue;
            };
            if !path.is_file() {
                continue;
            }
            return match fs::read_to_string(&path) {
                Ok(content) => SourceProviderResult::Success {
                    uri: uri.clone(),
                    content,
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", path.display(), e);
                    SourceProviderResult::Error {
                        uri: uri.clone(),
                        message: e.to_string(),
                    }
                }
            };
        }

        SourceProviderResult::NotFound {
            uri: candidates.last().cloned(),
        }
    }
}
