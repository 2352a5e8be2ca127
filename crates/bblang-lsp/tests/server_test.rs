//! End-to-end tests for the main loop: notifications in, protocol messages
//! out, with a fake compiler behind the scheduler.

mod common;

use common::{fixtures, uri, FakeCompiler, Harness, Mode};
use lsp_server::{ErrorCode, Message};
use lsp_types::notification::{
    Cancel, DidChangeTextDocument, DidCloseTextDocument, Exit, Notification, PublishDiagnostics,
    ShowMessage,
};
use lsp_types::request::{HoverRequest, Shutdown};
use lsp_types::{
    CancelParams, DiagnosticSeverity, DidChangeTextDocumentParams, DidCloseTextDocumentParams,
    HoverParams, MessageType, NumberOrString, Position, TextDocumentContentChangeEvent,
    TextDocumentIdentifier, TextDocumentPositionParams, VersionedTextDocumentIdentifier,
};
use std::sync::Arc;
use std::time::Duration;

const MAIN: &str = "file:///project/main.bbc";

fn hover_params(uri: &str, line: u32, character: u32) -> HoverParams {
    HoverParams {
        text_document_position_params: TextDocumentPositionParams {
            text_document: TextDocumentIdentifier { uri: common::uri(uri) },
            position: Position::new(line, character),
        },
        work_done_progress_params: Default::default(),
    }
}

fn hover_markdown(response: &lsp_server::Response) -> String {
    let result = response.result.clone().expect("hover result");
    result["contents"]["value"]
        .as_str()
        .expect("markdown contents")
        .to_string()
}

#[tokio::test]
async fn test_hover_after_open() {
    let mut harness = Harness::new(Arc::new(FakeCompiler::new(Mode::Fixture)));
    harness.open(&uri(MAIN), fixtures::SOURCE);
    harness.request::<HoverRequest>(1, hover_params(MAIN, 1, 12));

    let response = harness.response(1).await;
    assert_eq!(
        hover_markdown(&response),
        "```bbc\nint add(int a, int b)\n```\n---\nAdds two numbers."
    );
}

#[tokio::test]
async fn test_diagnostics_published_for_every_compiled_file() {
    let (a, b, c) = (
        bblang_core::FileUri::new("file:///project/a.bbc"),
        bblang_core::FileUri::new("file:///project/b.bbc"),
        bblang_core::FileUri::new("file:///project/c.bbc"),
    );
    let compiler = FakeCompiler::new(Mode::Project {
        files: vec![a.clone(), b.clone(), c.clone()],
        broken: Some(b.clone()),
    });
    let mut harness = Harness::new(Arc::new(compiler));
    harness.open(&uri(a.as_str()), "using \"b\";\nusing \"c\";\n");

    let published = harness.diagnostics(3).await;
    let uris: Vec<&str> = published.iter().map(|p| p.uri.as_str()).collect();
    assert_eq!(uris, vec![a.as_str(), b.as_str(), c.as_str()]);

    assert!(published[0].diagnostics.is_empty());
    assert_eq!(published[0].version, Some(1));
    assert_eq!(published[1].diagnostics.len(), 1);
    assert_eq!(
        published[1].diagnostics[0].severity,
        Some(DiagnosticSeverity::ERROR)
    );
    assert_eq!(published[1].diagnostics[0].message, "Unexpected token `}`");
    assert!(published[2].diagnostics.is_empty());

    let rest = harness.drain(Duration::from_millis(100)).await;
    assert!(!rest.iter().any(|message| matches!(
        message,
        Message::Notification(n) if n.method == "textDocument/publishDiagnostics"
    )));
}

#[tokio::test]
async fn test_aborted_compile_reports_language_error() {
    let compiler = FakeCompiler::new(Mode::Abort("Undefined symbol `foo`".to_string()));
    let mut harness = Harness::new(Arc::new(compiler));
    harness.open(&uri(MAIN), "foo();\n");

    let published = harness.notification::<PublishDiagnostics>().await;
    assert_eq!(published.uri.as_str(), MAIN);
    assert_eq!(published.diagnostics.len(), 1);
    assert_eq!(published.diagnostics[0].message, "Undefined symbol `foo`");

    // The previous (empty) analysis is kept, so hover finds nothing.
    harness.request::<HoverRequest>(2, hover_params(MAIN, 0, 1));
    let response = harness.response(2).await;
    assert_eq!(response.result, Some(serde_json::Value::Null));
}

#[tokio::test]
async fn test_compiler_panic_is_isolated() {
    let compiler = Arc::new(FakeCompiler::new(Mode::Panic));
    let mut harness = Harness::new(compiler.clone());
    harness.open(&uri(MAIN), "int x;\n");

    let message = harness.notification::<ShowMessage>().await;
    assert_eq!(message.typ, MessageType::ERROR);
    assert!(message.message.starts_with("BBLang "), "{}", message.message);

    // The server keeps answering after the crash.
    harness.request::<HoverRequest>(3, hover_params(MAIN, 0, 0));
    let response = harness.response(3).await;
    assert!(response.error.is_none());
    assert!(compiler.compilations() >= 1);
}

#[tokio::test]
async fn test_rapid_changes_compile_once() {
    let compiler = Arc::new(FakeCompiler::new(Mode::Fixture));
    let mut harness = Harness::new(compiler.clone());
    harness.open(&uri(MAIN), fixtures::SOURCE);

    for version in 2..=6 {
        harness.notify::<DidChangeTextDocument>(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri: uri(MAIN),
                version,
            },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text: fixtures::SOURCE.to_string(),
            }],
        });
    }

    let published = harness.notification::<PublishDiagnostics>().await;
    assert_eq!(published.version, Some(6));
    assert_eq!(compiler.compilations(), 1);
}

#[tokio::test]
async fn test_request_for_unknown_document_is_null() {
    let mut harness = Harness::new(Arc::new(FakeCompiler::new(Mode::Fixture)));
    harness.request::<HoverRequest>(4, hover_params("file:///project/missing.bbc", 0, 0));

    let response = harness.response(4).await;
    assert_eq!(response.result, Some(serde_json::Value::Null));
    assert!(response.error.is_none());
}

#[tokio::test]
async fn test_cancel_request() {
    let compiler = FakeCompiler::new(Mode::Fixture).with_delay(Duration::from_millis(300));
    let mut harness = Harness::new(Arc::new(compiler));
    harness.open(&uri(MAIN), fixtures::SOURCE);
    harness.request::<HoverRequest>(5, hover_params(MAIN, 1, 12));
    assert_eq!(harness.state.pending_requests(), 1);

    harness.notify::<Cancel>(CancelParams {
        id: NumberOrString::Number(5),
    });

    let response = harness.response(5).await;
    let error = response.error.expect("cancelled request fails");
    assert_eq!(error.code, ErrorCode::RequestCanceled as i32);
    assert_eq!(harness.state.pending_requests(), 0);
}

#[tokio::test]
async fn test_unknown_request_is_method_not_found() {
    let mut harness = Harness::new(Arc::new(FakeCompiler::new(Mode::Fixture)));
    let request = lsp_server::Request::new(
        6.into(),
        "textDocument/rename".to_string(),
        serde_json::json!({}),
    );
    harness.state.handle_message(Message::Request(request));

    let response = harness.response(6).await;
    let error = response.error.expect("unknown method fails");
    assert_eq!(error.code, ErrorCode::MethodNotFound as i32);
}

#[tokio::test]
async fn test_invalid_params() {
    let mut harness = Harness::new(Arc::new(FakeCompiler::new(Mode::Fixture)));
    let request = lsp_server::Request::new(
        7.into(),
        "textDocument/hover".to_string(),
        serde_json::json!({ "position": 3 }),
    );
    harness.state.handle_message(Message::Request(request));

    let response = harness.response(7).await;
    let error = response.error.expect("malformed params fail");
    assert_eq!(error.code, ErrorCode::InvalidParams as i32);
}

#[tokio::test]
async fn test_close_clears_diagnostics() {
    let mut harness = Harness::new(Arc::new(FakeCompiler::new(Mode::Fixture)));
    harness.open(&uri(MAIN), fixtures::SOURCE);
    harness.notification::<PublishDiagnostics>().await;

    harness.notify::<DidCloseTextDocument>(DidCloseTextDocumentParams {
        text_document: TextDocumentIdentifier { uri: uri(MAIN) },
    });

    let cleared = harness.notification::<PublishDiagnostics>().await;
    assert_eq!(cleared.uri.as_str(), MAIN);
    assert!(cleared.diagnostics.is_empty());
    assert_eq!(cleared.version, None);
    assert_eq!(harness.state.world().scheduler_count(), 0);
    assert!(harness.state.world().documents().read().is_empty());
}

#[tokio::test]
async fn test_close_while_request_waits_answers_null() {
    let compiler = FakeCompiler::new(Mode::Fixture).with_delay(Duration::from_millis(300));
    let mut harness = Harness::new(Arc::new(compiler));
    harness.open(&uri(MAIN), fixtures::SOURCE);
    harness.request::<HoverRequest>(9, hover_params(MAIN, 1, 12));

    harness.notify::<DidCloseTextDocument>(DidCloseTextDocumentParams {
        text_document: TextDocumentIdentifier { uri: uri(MAIN) },
    });

    let mut sent = Vec::new();
    let response = loop {
        match harness.next_message().await {
            Message::Response(response) if response.id == 9.into() => break response,
            message => sent.push(message),
        }
    };
    assert!(response.error.is_none());
    assert_eq!(response.result, Some(serde_json::Value::Null));
    assert_eq!(harness.state.pending_requests(), 0);

    sent.extend(harness.drain(Duration::from_millis(400)).await);
    assert!(!sent.iter().any(|message| matches!(
        message,
        Message::Notification(notification) if notification.method == ShowMessage::METHOD
    )));
}

#[tokio::test]
async fn test_shutdown_then_exit() {
    let mut harness = Harness::new(Arc::new(FakeCompiler::new(Mode::Fixture)));
    harness.open(&uri(MAIN), fixtures::SOURCE);
    assert_eq!(harness.state.world().scheduler_count(), 1);

    harness.request::<Shutdown>(8, ());
    let response = harness.response(8).await;
    assert_eq!(response.result, Some(serde_json::Value::Null));
    assert!(harness.state.shutdown_requested());
    assert_eq!(harness.state.world().scheduler_count(), 0);

    assert!(!harness.notify::<Exit>(()));
}
