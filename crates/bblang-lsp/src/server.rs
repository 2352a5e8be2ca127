//! Main LSP server implementation.

use bblang_core::keywords::LANGUAGE_ID;
use bblang_core::Compiler;
use lsp_server::Connection;
use lsp_types::InitializeParams;
use std::sync::Arc;
use std::time::Duration;

use crate::client::Client;
use crate::handlers::semantic_tokens::get_capabilities as get_semantic_tokens_capabilities;
use crate::main_loop::run_main_loop;
use crate::scheduler::{DEFAULT_DEBOUNCE, DEFAULT_QUEUE_CAPACITY};
use crate::world::World;

/// Runtime knobs of the server.
#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// How long a document must stay unchanged before it is compiled.
    pub debounce: Duration,
    /// Capacity of each document's compile request queue.
    pub queue_capacity: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// The LSP server.
pub struct Server {
    /// Connection to the LSP client.
    connection: Connection,
    /// Initialize parameters from client.
    init_params: InitializeParams,
    compiler: Arc<dyn Compiler>,
    options: ServerOptions,
}

impl Server {
    /// Create a new LSP server from a connection.
    pub fn new(
        connection: Connection,
        init_params: InitializeParams,
        compiler: Arc<dyn Compiler>,
        options: ServerOptions,
    ) -> Self {
        Self {
            connection,
            init_params,
            compiler,
            options,
        }
    }

    /// Run the server's main loop until the client exits.
    pub fn run(self) -> std::io::Result<()> {
        tracing::info!("Starting BBLang Language Server v{}", crate::VERSION);

        if let Some(folders) = &self.init_params.workspace_folders {
            if let Some(folder) = folders.first() {
                tracing::info!("Workspace root: {}", folder.uri.as_str());
            }
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("bblang-lsp-worker")
            .enable_all()
            .build()?;

        let (sender, receiver) = (self.connection.sender, self.connection.receiver);
        let world = World::new(
            self.compiler,
            Client::new(sender),
            runtime.handle().clone(),
            self.options,
        );
        run_main_loop(receiver, world);

        runtime.shutdown_timeout(Duration::from_secs(1));
        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

/// The capabilities announced in the initialize response.
pub fn server_capabilities() -> lsp_types::ServerCapabilities {
    lsp_types::ServerCapabilities {
        text_document_sync: Some(lsp_types::TextDocumentSyncCapability::Kind(
            lsp_types::TextDocumentSyncKind::INCREMENTAL,
        )),
        notebook_document_sync: Some(lsp_types::OneOf::Left(
            lsp_types::NotebookDocumentSyncOptions {
                notebook_selector: vec![lsp_types::NotebookSelector::ByCells {
                    notebook: None,
                    cells: vec![lsp_types::NotebookCellSelector {
                        language: LANGUAGE_ID.to_string(),
                    }],
                }],
                save: Some(true),
            },
        )),
        hover_provider: Some(lsp_types::HoverProviderCapability::Simple(true)),
        completion_provider: Some(lsp_types::CompletionOptions {
            trigger_characters: Some(vec![
                ".".to_string(),  // Fields and methods
                "\"".to_string(), // Using paths
                "/".to_string(),  // Using path segments
            ]),
            ..Default::default()
        }),
        definition_provider: Some(lsp_types::OneOf::Left(true)),
        type_definition_provider: Some(lsp_types::TypeDefinitionProviderCapability::Simple(true)),
        references_provider: Some(lsp_types::OneOf::Left(true)),
        signature_help_provider: Some(lsp_types::SignatureHelpOptions {
            trigger_characters: Some(vec!["(".to_string(), ",".to_string()]),
            retrigger_characters: None,
            work_done_progress_options: Default::default(),
        }),
        document_symbol_provider: Some(lsp_types::OneOf::Left(true)),
        semantic_tokens_provider: Some(get_semantic_tokens_capabilities()),
        code_lens_provider: Some(lsp_types::CodeLensOptions {
            resolve_provider: Some(false),
        }),
        inlay_hint_provider: Some(lsp_types::OneOf::Left(true)),
        ..Default::default()
    }
}

/// Start the LSP server using stdio transport with default options.
pub fn start_stdio(compiler: Arc<dyn Compiler>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    start_stdio_with_options(compiler, ServerOptions::default())
}

/// Start the LSP server using stdio transport.
pub fn start_stdio_with_options(
    compiler: Arc<dyn Compiler>,
    options: ServerOptions,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing::info!("Starting LSP server on stdio");

    let (connection, io_threads) = Connection::stdio();

    // Wait for initialize request
    let (id, params) = connection.initialize_start()?;
    let init_params: InitializeParams = serde_json::from_value(params)?;

    let server_info = lsp_types::ServerInfo {
        name: "bblang-lsp".to_string(),
        version: Some(crate::VERSION.to_string()),
    };

    let init_result = lsp_types::InitializeResult {
        capabilities: server_capabilities(),
        server_info: Some(server_info),
    };

    connection.initialize_finish(id, serde_json::to_value(init_result)?)?;

    tracing::info!("LSP initialized successfully");

    let server = Server::new(connection, init_params, compiler, options);
    server.run()?;

    // Wait for IO threads to finish
    io_threads.join()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ServerOptions::default();
        assert_eq!(options.debounce, Duration::from_millis(150));
        assert_eq!(options.queue_capacity, 32);
    }

    #[test]
    fn test_capabilities() {
        let capabilities = server_capabilities();
        assert_eq!(
            capabilities.text_document_sync,
            Some(lsp_types::TextDocumentSyncCapability::Kind(
                lsp_types::TextDocumentSyncKind::INCREMENTAL
            ))
        );
        let triggers = capabilities
            .completion_provider
            .and_then(|options| options.trigger_characters)
            .unwrap();
        assert_eq!(triggers, vec![".", "\"", "/"]);
        let signature_triggers = capabilities
            .signature_help_provider
            .and_then(|options| options.trigger_characters)
            .unwrap();
        assert_eq!(signature_triggers, vec!["(", ","]);
        assert!(capabilities.notebook_document_sync.is_some());
        assert!(capabilities.rename_provider.is_none());
    }
}
