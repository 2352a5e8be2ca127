//! LSP request handlers.
//!
//! Each handler answers one request type against an immutable
//! [`Snapshot`](crate::Snapshot) of a compiled document.

pub mod utils;

pub mod code_lens;
pub mod completion;
pub mod definition;
pub mod diagnostics;
pub mod hover;
pub mod inlay_hints;
pub mod references;
pub mod semantic_tokens;
pub mod signature_help;
pub mod symbols;
pub mod type_definition;

#[cfg(test)]
pub(crate) mod fixtures;
