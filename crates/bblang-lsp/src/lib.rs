//! Language Server Protocol implementation for BBLang.
//!
//! This crate provides an LSP server for `.bbc` files on top of a
//! [`bblang_core::Compiler`], enabling IDE features like:
//! - Diagnostics published after each debounced compile
//! - Hover with types, values and doc comments
//! - Completion for members, types, keywords and `using` paths
//! - Go-to-definition, go-to-type-definition and references
//! - Signature help, document symbols, semantic tokens, code lens and
//!   inlay hints
//! - Jupyter-style notebooks whose cells are BBLang documents
//!
//! # Architecture
//!
//! - **Main loop**: Handles LSP messages in order and applies document changes
//! - **Scheduler**: One per document, debounces edits into compiles
//! - **Handlers**: Process LSP requests against immutable snapshots
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     bblang_lsp::init_logging();
//!     bblang_lsp::start_stdio(Arc::new(MyCompiler::default()))
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod compile;
pub mod config;
pub mod docs;
pub mod documents;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod main_loop;
pub mod notebook;
pub mod query;
pub mod scheduler;
pub mod world;

mod server;
mod snapshot;

pub use client::Client;
pub use documents::{Analysis, Document, DocumentStore};
pub use error::{CompileError, ConfigError, DocumentError, RequestError, SchedulerError, ServiceError};
pub use logging::init_logging;
pub use main_loop::run_main_loop;
pub use scheduler::CompilationScheduler;
pub use server::{server_capabilities, start_stdio, start_stdio_with_options, Server, ServerOptions};
pub use snapshot::Snapshot;
pub use world::World;

/// LSP server version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
