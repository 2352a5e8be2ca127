//! Shared utility functions for LSP handlers.
//!
//! Compiler positions are zero-based lines and UTF-16 columns, the same as
//! the protocol, so conversions here are field-for-field.

use bblang_core::{FileUri, GeneralType, Location, Range, SinglePosition};
use lsp_types::Uri;

/// Convert a protocol position.
pub const fn from_lsp_position(position: lsp_types::Position) -> SinglePosition {
    SinglePosition::new(position.line, position.character)
}

/// Convert to a protocol position.
pub const fn to_lsp_position(position: SinglePosition) -> lsp_types::Position {
    lsp_types::Position {
        line: position.line,
        character: position.character,
    }
}

/// Convert to a protocol range.
pub const fn to_lsp_range(range: Range) -> lsp_types::Range {
    lsp_types::Range {
        start: to_lsp_position(range.start),
        end: to_lsp_position(range.end),
    }
}

/// Convert a protocol range.
pub const fn from_lsp_range(range: lsp_types::Range) -> Range {
    Range::new(from_lsp_position(range.start), from_lsp_position(range.end))
}

/// Convert a protocol URI, keeping its text verbatim.
pub fn from_lsp_uri(uri: &Uri) -> FileUri {
    FileUri::new(uri.as_str())
}

/// Convert to a protocol URI. `None` if the text is not a valid URI.
pub fn to_lsp_uri(uri: &FileUri) -> Option<Uri> {
    match uri.as_str().parse::<Uri>() {
        Ok(uri) => Some(uri),
        Err(e) => {
            tracing::warn!("Invalid URI {}: {}", uri, e);
            None
        }
    }
}

/// Convert to a protocol location.
pub fn to_lsp_location(location: &Location) -> Option<lsp_types::Location> {
    Some(lsp_types::Location::new(
        to_lsp_uri(&location.file)?,
        to_lsp_range(location.range),
    ))
}

/// A link from `origin` in the current document to the declaration at
/// `target`.
pub fn to_location_link(origin: Range, target: &Location) -> Option<lsp_types::LocationLink> {
    Some(lsp_types::LocationLink {
        origin_selection_range: Some(to_lsp_range(origin)),
        target_uri: to_lsp_uri(&target.file)?,
        target_range: to_lsp_range(target.range),
        target_selection_range: to_lsp_range(target.range),
    })
}

/// Length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> u32 {
    text.encode_utf16().count() as u32
}

/// `(T) ` when the type is known, for prefixing hover lines.
pub fn type_prefix(ty: Option<&GeneralType>) -> String {
    ty.map(|ty| format!("({ty}) ")).unwrap_or_default()
}
