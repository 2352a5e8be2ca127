//! Shared helpers for the language server integration tests.

#![allow(dead_code)]

#[path = "../../src/handlers/fixtures.rs"]
pub mod fixtures;

use bblang_core::{
    Compiler, CompilerResult, CompilerSettings, Diagnostic, DiagnosticsCollection, FileUri,
    LanguageError, ParsedFile, ParserResult, PreprocessorVariables, Range, Token,
    TokenizerSettings,
};
use bblang_lsp::main_loop::MainLoopState;
use bblang_lsp::{Client, ServerOptions, World};
use crossbeam_channel::{Receiver, TryRecvError};
use lsp_server::{Message, RequestId, Response};
use lsp_types::notification::{Notification, PublishDiagnostics};
use lsp_types::request::Request;
use lsp_types::{PublishDiagnosticsParams, Uri};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long a test waits for the server before giving up.
const TIMEOUT: Duration = Duration::from_secs(10);

/// What the fake compiler does when asked to compile.
#[derive(Debug, Clone)]
pub enum Mode {
    /// Return the handler fixture program.
    Fixture,
    /// Compile `files` as one project; `broken` gets a syntax error.
    Project {
        files: Vec<FileUri>,
        broken: Option<FileUri>,
    },
    /// Abort the compilation with a language error.
    Abort(String),
    /// Panic inside the compiler.
    Panic,
}

/// A compiler that answers from canned results.
#[derive(Debug)]
pub struct FakeCompiler {
    mode: Mode,
    delay: Duration,
    compilations: AtomicUsize,
}

impl FakeCompiler {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            delay: Duration::ZERO,
            compilations: AtomicUsize::new(0),
        }
    }

    /// Block for `delay` inside every compile.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// How many times `compile` ran.
    pub fn compilations(&self) -> usize {
        self.compilations.load(Ordering::SeqCst)
    }
}

impl Compiler for FakeCompiler {
    fn compile(
        &self,
        files: &[FileUri],
        _settings: &CompilerSettings,
        diagnostics: &mut DiagnosticsCollection,
    ) -> Result<CompilerResult, LanguageError> {
        self.compilations.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        match &self.mode {
            Mode::Fixture => Ok(fixtures::result()),
            Mode::Project { files, broken } => {
                if let Some(broken) = broken {
                    diagnostics.add(Diagnostic::error(
                        "Unexpected token `}`",
                        Range::on_line(2, 4, 5),
                        Some(broken.clone()),
                    ));
                }
                Ok(CompilerResult {
                    files: files
                        .iter()
                        .map(|file| ParsedFile {
                            file: file.clone(),
                            ..Default::default()
                        })
                        .collect(),
                    ..Default::default()
                })
            }
            Mode::Abort(message) => Err(LanguageError::new(
                message.clone(),
                Range::on_line(0, 0, 1),
                files.first().cloned(),
            )),
            Mode::Panic => panic!("compiler crashed"),
        }
    }

    fn tokenize(
        &self,
        _text: &str,
        _diagnostics: &mut DiagnosticsCollection,
        _variables: &PreprocessorVariables,
        _uri: &FileUri,
        _settings: &TokenizerSettings,
    ) -> Vec<Token> {
        Vec::new()
    }

    fn parse(
        &self,
        _tokens: &[Token],
        _uri: &FileUri,
        _diagnostics: &mut DiagnosticsCollection,
    ) -> ParserResult {
        ParserResult::default()
    }
}

/// Options with a short debounce so tests run in real time.
pub fn test_options() -> ServerOptions {
    ServerOptions {
        debounce: Duration::from_millis(10),
        ..ServerOptions::default()
    }
}

/// Parse a URI used in a test.
pub fn uri(text: &str) -> Uri {
    text.parse().expect("valid test URI")
}

/// A main loop wired to an in-memory client.
pub struct Harness {
    pub state: MainLoopState,
    pub outgoing: Receiver<Message>,
}

impl Harness {
    /// Must be called inside a Tokio runtime.
    pub fn new(compiler: Arc<dyn Compiler>) -> Self {
        let (sender, outgoing) = crossbeam_channel::unbounded();
        let world = World::new(
            compiler,
            Client::new(sender),
            tokio::runtime::Handle::current(),
            test_options(),
        );
        Self {
            state: MainLoopState::new(world),
            outgoing,
        }
    }

    /// Deliver a notification. Returns whether the loop keeps running.
    pub fn notify<N: Notification>(&mut self, params: N::Params) -> bool {
        let notification = lsp_server::Notification::new(N::METHOD.to_string(), params);
        self.state.handle_message(Message::Notification(notification))
    }

    /// Deliver a request with a numeric id.
    pub fn request<R: Request>(&mut self, id: i32, params: R::Params) {
        let request = lsp_server::Request::new(RequestId::from(id), R::METHOD.to_string(), params);
        self.state.handle_message(Message::Request(request));
    }

    /// Open `text` as version 1 of `uri`.
    pub fn open(&mut self, uri: &Uri, text: &str) {
        self.notify::<lsp_types::notification::DidOpenTextDocument>(
            lsp_types::DidOpenTextDocumentParams {
                text_document: lsp_types::TextDocumentItem {
                    uri: uri.clone(),
                    language_id: "bbc".to_string(),
                    version: 1,
                    text: text.to_string(),
                },
            },
        );
    }

    /// Next message the server sent, waiting for it if needed.
    pub async fn next_message(&self) -> Message {
        let deadline = Instant::now() + TIMEOUT;
        loop {
            match self.outgoing.try_recv() {
                Ok(message) => return message,
                Err(TryRecvError::Disconnected) => panic!("client channel closed"),
                Err(TryRecvError::Empty) => {}
            }
            assert!(Instant::now() < deadline, "timed out waiting for the server");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// The response to request `id`, skipping notifications.
    pub async fn response(&self, id: i32) -> Response {
        let id = RequestId::from(id);
        loop {
            if let Message::Response(response) = self.next_message().await {
                if response.id == id {
                    return response;
                }
            }
        }
    }

    /// The next notification of type `N`, skipping everything else.
    pub async fn notification<N: Notification>(&self) -> N::Params {
        loop {
            if let Message::Notification(notification) = self.next_message().await {
                if notification.method == N::METHOD {
                    return serde_json::from_value(notification.params)
                        .expect("notification params");
                }
            }
        }
    }

    /// The next `count` diagnostics publications.
    pub async fn diagnostics(&self, count: usize) -> Vec<PublishDiagnosticsParams> {
        let mut published = Vec::with_capacity(count);
        while published.len() < count {
            published.push(self.notification::<PublishDiagnostics>().await);
        }
        published
    }

    /// Let the server run for `duration` and return what it sent.
    pub async fn drain(&self, duration: Duration) -> Vec<Message> {
        tokio::time::sleep(duration).await;
        self.outgoing.try_iter().collect()
    }
}
