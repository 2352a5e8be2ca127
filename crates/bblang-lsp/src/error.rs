//! Error types for the language server.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from registering or loading a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The language id has no document implementation.
    #[error("Unknown language \"{language_id}\"")]
    UnknownLanguage {
        /// The rejected language id.
        language_id: String,
    },

    /// A `file:` document was requested without content and is not on disk.
    #[error("File not found: \"{}\"", .path.display())]
    FileNotFound {
        /// The decoded path that was checked.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("failed to read file {}: {source}", .path.display())]
    Io {
        /// The path that failed to read.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors from reading a project configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        /// The configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON of the expected shape.
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        /// The configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of the compile pipeline itself, as opposed to errors in the
/// compiled source.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler panicked.
    #[error("{message}")]
    Panic {
        /// The panic payload, when it was a string.
        message: String,
    },

    /// The blocking compile task was cancelled before it finished.
    #[error("compilation task was cancelled")]
    Aborted,

    /// The document could not be prepared for compilation.
    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl CompileError {
    /// Short name of the failure, shown to the user next to the message.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Panic { .. } => "CompilerPanic",
            Self::Aborted => "TaskCanceledException",
            Self::Document(_) => "DocumentException",
        }
    }

    /// Build from a failed `spawn_blocking` join.
    pub fn from_join(error: tokio::task::JoinError) -> Self {
        if error.is_cancelled() {
            return Self::Aborted;
        }
        let payload = error.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "compiler panicked".to_string());
        Self::Panic { message }
    }
}

/// Errors from waiting on a document's compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The waiter's cancellation token fired.
    #[error("compilation wait was cancelled")]
    Cancelled,

    /// The scheduler was shut down, usually because the document closed.
    #[error("compilation scheduler is closed")]
    Closed,
}

/// A failure while serving a request that should be reported to the user
/// without failing the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ServiceError {
    /// What went wrong.
    pub message: String,
}

impl ServiceError {
    /// Create a service error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<DocumentError> for ServiceError {
    fn from(error: DocumentError) -> Self {
        Self::new(error.to_string())
    }
}

/// Why a request could not be answered from a fresh snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The client cancelled the request.
    #[error("request was cancelled")]
    Cancelled,

    /// The document was closed before the request could be answered.
    #[error("document {uri} was closed")]
    Disposed {
        /// The closed document.
        uri: String,
    },

    /// The request failed in a way the user should hear about.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_error_messages() {
        let error = DocumentError::UnknownLanguage {
            language_id: "py".to_string(),
        };
        assert_eq!(error.to_string(), "Unknown language \"py\"");

        let error = DocumentError::FileNotFound {
            path: PathBuf::from("/tmp/missing.bbc"),
        };
        assert_eq!(error.to_string(), "File not found: \"/tmp/missing.bbc\"");
    }

    #[test]
    fn test_compile_error_kind() {
        let error = CompileError::Panic {
            message: "index out of bounds".to_string(),
        };
        assert_eq!(error.kind(), "CompilerPanic");
        assert_eq!(error.to_string(), "index out of bounds");

        let error = CompileError::from(DocumentError::UnknownLanguage {
            language_id: "x".to_string(),
        });
        assert_eq!(error.kind(), "DocumentException");
    }

    #[tokio::test]
    async fn test_compile_error_from_panicking_join() {
        let join = tokio::task::spawn_blocking(|| -> i32 { panic!("boom") }).await;
        let error = CompileError::from_join(join.unwrap_err());
        assert_eq!(error.to_string(), "boom");
    }
}
