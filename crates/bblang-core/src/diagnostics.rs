//! Diagnostics reported by the compiler.

use thiserror::Error;

use crate::{FileUri, Range};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticsLevel {
    /// Compilation cannot succeed.
    Error,
    /// Suspicious code.
    Warning,
    /// Informational note.
    Information,
    /// Style hint.
    Hint,
    /// An optimisation was applied.
    OptimizationNotice,
    /// An optimisation could not be applied.
    FailedOptimization,
}

/// A diagnostic attached to a place in source.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Severity.
    pub level: DiagnosticsLevel,
    /// Human-readable message.
    pub message: String,
    /// Where it applies.
    pub range: Range,
    /// File it applies to. Diagnostics without a file cannot be shown inline.
    pub file: Option<FileUri>,
    /// Follow-up diagnostics explaining this one.
    pub sub_errors: Vec<Diagnostic>,
}

impl Diagnostic {
    /// Create a diagnostic without sub-errors.
    pub fn new(
        level: DiagnosticsLevel,
        message: impl Into<String>,
        range: Range,
        file: Option<FileUri>,
    ) -> Self {
        Self {
            level,
            message: message.into(),
            range,
            file,
            sub_errors: Vec::new(),
        }
    }

    /// Shorthand for an error.
    pub fn error(message: impl Into<String>, range: Range, file: Option<FileUri>) -> Self {
        Self::new(DiagnosticsLevel::Error, message, range, file)
    }

    /// Attach a follow-up diagnostic.
    #[must_use]
    pub fn with_sub_error(mut self, sub_error: Self) -> Self {
        self.sub_errors.push(sub_error);
        self
    }
}

/// A diagnostic that could not be tied to any file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticWithoutContext {
    /// Severity.
    pub level: DiagnosticsLevel,
    /// Human-readable message.
    pub message: String,
}

/// Diagnostics collected during one compilation.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsCollection {
    diagnostics: Vec<Diagnostic>,
    without_context: Vec<DiagnosticWithoutContext>,
}

impl DiagnosticsCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Record a diagnostic that has no file.
    pub fn add_without_context(&mut self, level: DiagnosticsLevel, message: impl Into<String>) {
        self.without_context.push(DiagnosticWithoutContext {
            level,
            message: message.into(),
        });
    }

    /// Diagnostics tied to a place in source.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics without any source location.
    pub fn without_context(&self) -> &[DiagnosticWithoutContext] {
        &self.without_context
    }

    /// Whether any error was recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.level == DiagnosticsLevel::Error)
            || self
                .without_context
                .iter()
                .any(|d| d.level == DiagnosticsLevel::Error)
    }

    /// Drop everything collected so far.
    pub fn clear(&mut self) {
        self.diagnostics.clear();
        self.without_context.clear();
    }
}

/// A failure the compiler reports by aborting.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct LanguageError {
    /// What went wrong.
    pub message: String,
    /// Where it went wrong.
    pub range: Range,
    /// File it went wrong in.
    pub file: Option<FileUri>,
}

impl LanguageError {
    /// Create a language error.
    pub fn new(message: impl Into<String>, range: Range, file: Option<FileUri>) -> Self {
        Self {
            message: message.into(),
            range,
            file,
        }
    }
}

impl From<LanguageError> for Diagnostic {
    fn from(error: LanguageError) -> Self {
        Self::error(error.message, error.range, error.file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_errors() {
        let mut diagnostics = DiagnosticsCollection::new();
        diagnostics.add(Diagnostic::new(
            DiagnosticsLevel::Warning,
            "unused",
            Range::default(),
            None,
        ));
        assert!(!diagnostics.has_errors());

        diagnostics.add_without_context(DiagnosticsLevel::Error, "no entry point");
        assert!(diagnostics.has_errors());

        diagnostics.clear();
        assert!(diagnostics.diagnostics().is_empty());
        assert!(diagnostics.without_context().is_empty());
    }

    #[test]
    fn test_language_error_into_diagnostic() {
        let file = FileUri::new("file:///a.bbc");
        let error = LanguageError::new("Unexpected token", Range::on_line(3, 1, 2), Some(file.clone()));
        assert_eq!(error.to_string(), "Unexpected token");

        let diagnostic = Diagnostic::from(error);
        assert_eq!(diagnostic.level, DiagnosticsLevel::Error);
        assert_eq!(diagnostic.file, Some(file));
    }
}
