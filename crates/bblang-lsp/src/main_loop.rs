//! Main event loop for the LSP server.
//!
//! - Notifications are handled synchronously, in arrival order
//! - Requests run as tasks that first wait for their document's compile,
//!   then answer from a snapshot
//! - `$/cancelRequest` cancels the wait of a pending request

use bblang_core::FileUri;
use crossbeam_channel::Receiver;
use lsp_server::{ErrorCode, RequestId};
use lsp_types::notification::{
    Cancel, DidChangeConfiguration, DidChangeNotebookDocument, DidChangeTextDocument,
    DidCloseNotebookDocument, DidCloseTextDocument, DidOpenNotebookDocument, DidOpenTextDocument,
    DidSaveNotebookDocument, DidSaveTextDocument, Exit, Initialized, Notification,
};
use lsp_types::request::{
    CodeLensRequest, Completion, DocumentSymbolRequest, GotoDefinition, GotoTypeDefinition,
    HoverRequest, InlayHintRequest, References, Request, SemanticTokensFullRequest, Shutdown,
    SignatureHelpRequest,
};
use lsp_types::{
    CancelParams, CodeLensParams, CompletionParams, DidChangeConfigurationParams,
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams, DocumentSymbolParams, GotoDefinitionParams, HoverParams,
    InlayHintParams, MessageType, NumberOrString, ReferenceParams, SemanticTokensParams,
    SignatureHelpParams, Uri,
};
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::documents::DocumentStore;
use crate::error::{RequestError, SchedulerError};
use crate::handlers::code_lens::handle_code_lens;
use crate::handlers::completion::handle_completion;
use crate::handlers::definition::handle_goto_definition;
use crate::handlers::hover::handle_hover;
use crate::handlers::inlay_hints::handle_inlay_hints;
use crate::handlers::references::handle_references;
use crate::handlers::semantic_tokens::handle_semantic_tokens;
use crate::handlers::signature_help::handle_signature_help;
use crate::handlers::symbols::handle_document_symbols;
use crate::handlers::type_definition::handle_goto_type_definition;
use crate::handlers::utils::from_lsp_uri;
use crate::notebook::{DidChangeNotebookParams, DidCloseNotebookParams, DidOpenNotebookParams, DidSaveNotebookParams};
use crate::scheduler::CompilationScheduler;
use crate::snapshot::Snapshot;
use crate::world::World;

/// Requests that address a single document.
pub trait DocumentRequest {
    /// The document the request is about.
    fn document_uri(&self) -> &Uri;
}

macro_rules! position_request {
    ($($params:ty => $field:ident),* $(,)?) => {
        $(
            impl DocumentRequest for $params {
                fn document_uri(&self) -> &Uri {
                    &self.$field.text_document.uri
                }
            }
        )*
    };
}

position_request! {
    HoverParams => text_document_position_params,
    CompletionParams => text_document_position,
    GotoDefinitionParams => text_document_position_params,
    ReferenceParams => text_document_position,
    SignatureHelpParams => text_document_position_params,
}

macro_rules! document_request {
    ($($params:ty),* $(,)?) => {
        $(
            impl DocumentRequest for $params {
                fn document_uri(&self) -> &Uri {
                    &self.text_document.uri
                }
            }
        )*
    };
}

document_request!(
    DocumentSymbolParams,
    SemanticTokensParams,
    CodeLensParams,
    InlayHintParams,
);

/// Whether the loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// State managed by the main loop.
pub struct MainLoopState {
    world: World,
    /// Cancellation tokens of requests still waiting for an answer.
    pending: Arc<Mutex<HashMap<RequestId, CancellationToken>>>,
    /// Whether shutdown was requested.
    shutdown_requested: bool,
}

impl MainLoopState {
    /// Create a new main loop state.
    pub fn new(world: World) -> Self {
        Self {
            world,
            pending: Arc::new(Mutex::new(HashMap::new())),
            shutdown_requested: false,
        }
    }

    /// The server state.
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Whether shutdown was requested.
    pub const fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// Number of requests still waiting for an answer.
    pub fn pending_requests(&self) -> usize {
        self.pending.lock().len()
    }

    /// Handle one message. Returns `false` once the client asked to exit.
    pub fn handle_message(&mut self, message: lsp_server::Message) -> bool {
        let flow = match message {
            lsp_server::Message::Request(req) => {
                self.handle_request(req);
                Flow::Continue
            }
            lsp_server::Message::Notification(notif) => self.handle_notification(notif),
            lsp_server::Message::Response(_resp) => {
                // We don't send requests to the client
                Flow::Continue
            }
        };
        flow == Flow::Continue
    }

    /// Handle an LSP request (expects response).
    fn handle_request(&mut self, req: lsp_server::Request) {
        match req.method.as_str() {
            Shutdown::METHOD => {
                self.shutdown_requested = true;
                self.world.shutdown();
                self.world
                    .client()
                    .respond(lsp_server::Response::new_ok(req.id, serde_json::Value::Null));
            }
            HoverRequest::METHOD => self.spawn_request::<HoverParams, _, _>(req, handle_hover),
            Completion::METHOD => {
                self.spawn_request::<CompletionParams, _, _>(req, handle_completion);
            }
            GotoDefinition::METHOD => {
                self.spawn_request::<GotoDefinitionParams, _, _>(req, handle_goto_definition);
            }
            GotoTypeDefinition::METHOD => {
                self.spawn_request::<GotoDefinitionParams, _, _>(req, handle_goto_type_definition);
            }
            References::METHOD => self.spawn_request::<ReferenceParams, _, _>(req, handle_references),
            SignatureHelpRequest::METHOD => {
                self.spawn_request::<SignatureHelpParams, _, _>(req, handle_signature_help);
            }
            DocumentSymbolRequest::METHOD => {
                self.spawn_request::<DocumentSymbolParams, _, _>(req, handle_document_symbols);
            }
            SemanticTokensFullRequest::METHOD => {
                self.spawn_request::<SemanticTokensParams, _, _>(req, handle_semantic_tokens);
            }
            CodeLensRequest::METHOD => self.spawn_request::<CodeLensParams, _, _>(req, handle_code_lens),
            InlayHintRequest::METHOD => {
                self.spawn_request::<InlayHintParams, _, _>(req, handle_inlay_hints);
            }
            _ => {
                tracing::warn!("Unhandled request: {}", req.method);
                self.world.client().respond(lsp_server::Response::new_err(
                    req.id,
                    ErrorCode::MethodNotFound as i32,
                    format!("Unhandled request: {}", req.method),
                ));
            }
        }
    }

    /// Answer `req` from a snapshot taken once its document has compiled.
    fn spawn_request<P, R, F>(&mut self, req: lsp_server::Request, handler: F)
    where
        P: DocumentRequest + DeserializeOwned + Send + 'static,
        R: Serialize,
        F: FnOnce(&P, &Snapshot) -> Option<R> + Send + 'static,
    {
        let id = req.id;
        let params: P = match serde_json::from_value(req.params) {
            Ok(params) => params,
            Err(e) => {
                self.world.client().respond(lsp_server::Response::new_err(
                    id,
                    ErrorCode::InvalidParams as i32,
                    e.to_string(),
                ));
                return;
            }
        };

        let uri = from_lsp_uri(params.document_uri());
        let Some((scheduler, version)) = self.world.compilation_waiter(&uri) else {
            tracing::debug!("{} for unknown document {}", req.method, uri);
            self.world
                .client()
                .respond(lsp_server::Response::new_ok(id, serde_json::Value::Null));
            return;
        };

        let token = CancellationToken::new();
        self.pending.lock().insert(id.clone(), token.clone());

        let pending = Arc::clone(&self.pending);
        let documents = Arc::clone(self.world.documents());
        let client = self.world.client().clone();
        self.world.runtime().spawn(async move {
            let response = match await_snapshot(&scheduler, version, &token, &documents, &uri).await {
                Ok(snapshot) => match serde_json::to_value(handler(&params, &snapshot)) {
                    Ok(value) => lsp_server::Response::new_ok(id.clone(), value),
                    Err(e) => lsp_server::Response::new_err(
                        id.clone(),
                        ErrorCode::InternalError as i32,
                        e.to_string(),
                    ),
                },
                Err(RequestError::Cancelled) => lsp_server::Response::new_err(
                    id.clone(),
                    ErrorCode::RequestCanceled as i32,
                    RequestError::Cancelled.to_string(),
                ),
                Err(e @ RequestError::Disposed { .. }) => {
                    tracing::debug!("{}", e);
                    lsp_server::Response::new_ok(id.clone(), serde_json::Value::Null)
                }
                Err(RequestError::Service(e)) => {
                    tracing::warn!("Request on {} failed: {}", uri, e);
                    client.show_message(MessageType::WARNING, format!("BBLang ServiceException: {e}"));
                    lsp_server::Response::new_ok(id.clone(), serde_json::Value::Null)
                }
            };
            pending.lock().remove(&id);
            client.respond(response);
        });
    }

    /// Handle an LSP notification.
    fn handle_notification(&mut self, notif: lsp_server::Notification) -> Flow {
        let lsp_server::Notification { method, params } = notif;
        // Notifications are handled synchronously - this is critical for correctness
        match method.as_str() {
            DidOpenTextDocument::METHOD => {
                if let Some(params) = parse_params::<DidOpenTextDocumentParams>(&method, params) {
                    self.on_did_open(params);
                }
            }
            DidChangeTextDocument::METHOD => {
                if let Some(params) = parse_params::<DidChangeTextDocumentParams>(&method, params) {
                    self.on_did_change(params);
                }
            }
            DidSaveTextDocument::METHOD => {
                if let Some(params) = parse_params::<DidSaveTextDocumentParams>(&method, params) {
                    self.on_did_save(params);
                }
            }
            DidCloseTextDocument::METHOD => {
                if let Some(params) = parse_params::<DidCloseTextDocumentParams>(&method, params) {
                    self.world.close(&from_lsp_uri(&params.text_document.uri));
                }
            }
            DidOpenNotebookDocument::METHOD => {
                if let Some(params) = parse_params::<DidOpenNotebookParams>(&method, params) {
                    self.on_did_open_notebook(&params);
                }
            }
            DidChangeNotebookDocument::METHOD => {
                if let Some(params) = parse_params::<DidChangeNotebookParams>(&method, params) {
                    self.on_did_change_notebook(&params);
                }
            }
            DidSaveNotebookDocument::METHOD => {
                if let Some(params) = parse_params::<DidSaveNotebookParams>(&method, params) {
                    self.world.documents().write().save_notebook(&params);
                }
            }
            DidCloseNotebookDocument::METHOD => {
                if let Some(params) = parse_params::<DidCloseNotebookParams>(&method, params) {
                    self.on_did_close_notebook(&params);
                }
            }
            DidChangeConfiguration::METHOD => {
                if let Some(params) = parse_params::<DidChangeConfigurationParams>(&method, params) {
                    tracing::debug!("Client settings changed");
                    self.world.set_client_settings(params.settings);
                }
            }
            Cancel::METHOD => {
                if let Some(params) = parse_params::<CancelParams>(&method, params) {
                    self.on_cancel(params);
                }
            }
            Initialized::METHOD => {
                tracing::info!("Client initialized");
            }
            Exit::METHOD => {
                tracing::info!("Exit notification received");
                return Flow::Exit;
            }
            _ => {
                tracing::debug!("Unhandled notification: {}", method);
            }
        }
        Flow::Continue
    }

    fn on_did_open(&mut self, params: DidOpenTextDocumentParams) {
        let item = params.text_document;
        let uri = from_lsp_uri(&item.uri);
        tracing::info!("Document opened: {}", uri);

        let opened = {
            let mut store = self.world.documents().write();
            store
                .get_or_create_with_language(&uri, &item.language_id, Some(&item.text))
                .map(|document| document.on_opened(&item.text, item.version))
        };
        match opened {
            Ok(()) => self.world.request_compile(&uri),
            Err(e) => tracing::warn!("Cannot open {}: {}", uri, e),
        }
    }

    fn on_did_change(&mut self, params: DidChangeTextDocumentParams) {
        let uri = from_lsp_uri(&params.text_document.uri);
        let changed = update_document(self.world.documents(), &uri, |document| {
            document.on_changed(&params.content_changes, params.text_document.version);
        });
        if changed {
            self.world.cache().invalidate(&uri);
            self.world.request_compile(&uri);
        }
    }

    fn on_did_save(&mut self, params: DidSaveTextDocumentParams) {
        let uri = from_lsp_uri(&params.text_document.uri);
        let saved = update_document(self.world.documents(), &uri, |document| {
            document.on_saved(params.text.as_deref());
        });
        if saved {
            self.world.cache().invalidate(&uri);
            self.world.request_compile(&uri);
        }
    }

    fn on_did_open_notebook(&mut self, params: &DidOpenNotebookParams) {
        let opened = self.world.documents().write().open_notebook(params);
        match opened {
            Ok(cells) => {
                for cell in &cells {
                    self.world.request_compile(cell);
                }
            }
            Err(e) => tracing::warn!("Cannot open notebook {}: {}", params.notebook_document.uri, e),
        }
    }

    fn on_did_change_notebook(&mut self, params: &DidChangeNotebookParams) {
        let closed: Vec<FileUri> = params
            .change
            .cells
            .iter()
            .filter_map(|cells| cells.structure.as_ref())
            .flat_map(|structure| structure.did_close.iter().flatten())
            .map(|cell| cell.uri.clone())
            .collect();

        let touched = self.world.documents().write().change_notebook(params);
        for cell in &closed {
            self.world.close(cell);
        }
        match touched {
            Ok(cells) => {
                for cell in &cells {
                    self.world.cache().invalidate(cell);
                    self.world.request_compile(cell);
                }
            }
            Err(e) => tracing::warn!("Cannot change notebook {}: {}", params.notebook_document.uri, e),
        }
    }

    fn on_did_close_notebook(&mut self, params: &DidCloseNotebookParams) {
        for cell in &params.cell_text_documents {
            self.world.close(&cell.uri);
        }
        self.world
            .documents()
            .write()
            .remove(&params.notebook_document.uri);
    }

    fn on_cancel(&self, params: CancelParams) {
        let id: RequestId = match params.id {
            NumberOrString::Number(id) => id.into(),
            NumberOrString::String(id) => id.into(),
        };
        if let Some(token) = self.pending.lock().get(&id) {
            tracing::debug!("Cancelling request {}", id);
            token.cancel();
        }
    }
}

/// Parse notification params, logging what does not parse.
fn parse_params<P: DeserializeOwned>(method: &str, params: serde_json::Value) -> Option<P> {
    match serde_json::from_value(params) {
        Ok(params) => Some(params),
        Err(e) => {
            tracing::warn!("Invalid {} params: {}", method, e);
            None
        }
    }
}

/// Apply `update` to the document for `uri`, registering it first if it is
/// unknown. Returns whether the update happened.
fn update_document(
    documents: &RwLock<DocumentStore>,
    uri: &FileUri,
    update: impl FnOnce(&mut crate::documents::Document),
) -> bool {
    match documents.write().get_or_create(uri, None) {
        Ok(document) => {
            update(document);
            true
        }
        Err(e) => {
            tracing::warn!("Cannot update {}: {}", uri, e);
            false
        }
    }
}

/// Wait for the compile of `version`, then snapshot the document.
async fn await_snapshot(
    scheduler: &CompilationScheduler,
    version: i32,
    token: &CancellationToken,
    documents: &RwLock<DocumentStore>,
    uri: &FileUri,
) -> Result<Snapshot, RequestError> {
    scheduler
        .await_compilation(version, token)
        .await
        .map_err(|e| match e {
            SchedulerError::Cancelled => RequestError::Cancelled,
            SchedulerError::Closed => RequestError::Disposed {
                uri: uri.to_string(),
            },
        })?;
    Snapshot::capture(&documents.read(), uri).ok_or_else(|| RequestError::Disposed {
        uri: uri.to_string(),
    })
}

/// Run the main loop until the client exits or the connection closes.
pub fn run_main_loop(receiver: Receiver<lsp_server::Message>, world: World) {
    let mut state = MainLoopState::new(world);

    tracing::info!("Main loop started");

    for msg in receiver {
        if !state.handle_message(msg) {
            break;
        }
    }

    state.world.shutdown();
    tracing::info!("Main loop ended");
}
