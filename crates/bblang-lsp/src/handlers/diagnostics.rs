//! Conversion of compiler diagnostics to LSP diagnostics.

use bblang_core::{Diagnostic, DiagnosticsLevel, FileUri};
use lsp_types::DiagnosticSeverity;

use super::utils::to_lsp_range;

/// Map a compiler level to an LSP severity.
pub const fn severity(level: DiagnosticsLevel) -> DiagnosticSeverity {
    match level {
        DiagnosticsLevel::Error => DiagnosticSeverity::ERROR,
        DiagnosticsLevel::Warning => DiagnosticSeverity::WARNING,
        DiagnosticsLevel::Information
        | DiagnosticsLevel::OptimizationNotice
        | DiagnosticsLevel::FailedOptimization => DiagnosticSeverity::INFORMATION,
        DiagnosticsLevel::Hint => DiagnosticSeverity::HINT,
    }
}

/// The message of `diagnostic` followed by its sub-errors, each on its own
/// line and indented by depth.
pub fn full_message(diagnostic: &Diagnostic) -> String {
    let mut message = diagnostic.message.clone();
    append_sub_errors(diagnostic, 0, &mut message);
    message
}

fn append_sub_errors(diagnostic: &Diagnostic, indent: usize, message: &mut String) {
    for sub_error in &diagnostic.sub_errors {
        message.push('\n');
        message.push_str(&" ".repeat(indent));
        message.push_str(" -> ");
        message.push_str(&sub_error.message);
        append_sub_errors(sub_error, indent + 2, message);
    }
}

/// Every diagnostic that belongs in `file`.
///
/// Sub-errors pointing somewhere other than their parent are also reported
/// on their own.
pub fn diagnostics_for_file(diagnostics: &[Diagnostic], file: &FileUri) -> Vec<lsp_types::Diagnostic> {
    let mut result = Vec::new();
    for diagnostic in diagnostics {
        collect(diagnostic, file, &mut result);
    }
    result
}

fn collect(diagnostic: &Diagnostic, file: &FileUri, result: &mut Vec<lsp_types::Diagnostic>) {
    if diagnostic.file.as_ref() == Some(file) {
        result.push(to_lsp_diagnostic(diagnostic, file));
    }
    for sub_error in &diagnostic.sub_errors {
        if sub_error.range != diagnostic.range || sub_error.file != diagnostic.file {
            collect(sub_error, file, result);
        }
    }
}

/// Convert one diagnostic.
pub fn to_lsp_diagnostic(diagnostic: &Diagnostic, file: &FileUri) -> lsp_types::Diagnostic {
    lsp_types::Diagnostic {
        range: to_lsp_range(diagnostic.range),
        severity: Some(severity(diagnostic.level)),
        code: None,
        code_description: None,
        source: Some(file.to_string()),
        message: full_message(diagnostic),
        related_information: None,
        tags: None,
        data: None,
    }
}
