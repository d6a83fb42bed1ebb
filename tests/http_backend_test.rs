//! HttpBackend against a canned localhost server
mod common;

use std::time::Duration;

use common::CannedServer;
use vta_chat::client::{Backend, HttpBackend};
use vta_chat::error::ClientError;

fn backend(server: &CannedServer) -> HttpBackend {
    HttpBackend::new(server.url(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_login_posts_form_and_returns_token() {
    let server =
        CannedServer::start(vec![(200, r#"{"access_token":"abc","token_type":"bearer"}"#)]);
    let token = backend(&server).login("tech@example.com", "s3cret").await.unwrap();
    assert_eq!(token, "abc");

    let requests = server.finish();
    assert_eq!(requests[0].request_line, "POST /auth/token HTTP/1.1");
    assert_eq!(requests[0].header("content-type"), Some("application/x-www-form-urlencoded"));
    assert_eq!(requests[0].body_text(), "username=tech%40example.com&password=s3cret");
}

#[tokio::test]
async fn test_login_without_token_is_an_error() {
    let server = CannedServer::start(vec![(200, r#"{"token_type":"bearer"}"#)]);
    let err = backend(&server).login("a@b.c", "pw").await.unwrap_err();
    assert!(matches!(err, ClientError::MissingToken));
    assert_eq!(err.to_string(), "No access token received");
    server.finish();
}

#[tokio::test]
async fn test_query_sends_bearer_and_thread_id() {
    let server = CannedServer::start(vec![(
        200,
        r#"{"answer":"Check the fuse.","source_nodes":[{"text":"Fuse box","score":"0.912"}]}"#,
    )]);
    let reply = backend(&server).query("tok-1", "No power", "thread-7").await.unwrap();
    assert_eq!(reply.answer, "Check the fuse.");
    assert_eq!(reply.source_nodes[0].display_score(), "0.91");

    let requests = server.finish();
    assert_eq!(requests[0].request_line, "POST /chat/query HTTP/1.1");
    assert_eq!(requests[0].header("authorization"), Some("Bearer tok-1"));
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body, serde_json::json!({"query": "No power", "session_id": "thread-7"}));
}

#[tokio::test]
async fn test_history_and_sessions_decode() {
    let server = CannedServer::start(vec![
        (
            200,
            r#"{"history":[{"role":"user","content":"hi"},{"role":"assistant","content":"hello","source_nodes":null}]}"#,
        ),
        (200, r#"{"sessions":[{"id":"s1","title":"Brakes","created_at":"2025-01-01T00:00:00"}]}"#),
        (200, r#"{"session_id":"s2"}"#),
    ]);
    let backend = backend(&server);

    let history = backend.history("tok", "s1").await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(!history[1].has_sources());

    let sessions = backend.list_sessions("tok").await.unwrap();
    assert_eq!(sessions[0].display_title(), "Brakes");
    assert!(sessions[0].created_at_utc().is_some());

    assert_eq!(backend.new_session("tok").await.unwrap(), "s2");

    let requests = server.finish();
    assert_eq!(requests[0].request_line, "POST /chat/history HTTP/1.1");
    assert_eq!(requests[1].request_line, "GET /chat/sessions HTTP/1.1");
    assert_eq!(requests[2].request_line, "GET /chat/new-session HTTP/1.1");
    assert!(requests.iter().all(|r| r.header("authorization") == Some("Bearer tok")));
}

#[tokio::test]
async fn test_unauthorized_status_is_classified() {
    let server = CannedServer::start(vec![
        (401, r#"{"detail":"Not authenticated"}"#),
        (403, r#"{"detail":"Admin privileges required"}"#),
        (500, r#"{"detail":"Vector store unavailable"}"#),
    ]);
    let backend = backend(&server);

    let err = backend.list_documents("stale").await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.detail(), Some("Not authenticated"));

    let err = backend.list_documents("user").await.unwrap_err();
    assert!(err.is_unauthorized());

    let err = backend.list_documents("admin").await.unwrap_err();
    assert!(!err.is_unauthorized());
    assert_eq!(err.detail(), Some("Vector store unavailable"));
    server.finish();
}

#[tokio::test]
async fn test_lenient_manual_listing() {
    let server = CannedServer::start(vec![
        (200, r#"{"manuals":[{"file_name":"engine.pdf"}]}"#),
        (200, r#"{"manuals":"none"}"#),
    ]);
    let backend = backend(&server);

    let files = backend.list_documents("tok").await.unwrap();
    assert_eq!(files[0].file_name, "engine.pdf");
    assert!(backend.list_documents("tok").await.unwrap().is_empty());
    server.finish();
}

#[tokio::test]
async fn test_malformed_success_body_is_decode_error() {
    let server = CannedServer::start(vec![(200, "<html>gateway</html>")]);
    let err = backend(&server).new_session("tok").await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
    server.finish();
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    let backend = HttpBackend::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let err = backend.list_sessions("tok").await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
}
