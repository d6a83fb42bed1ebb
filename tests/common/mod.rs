//! Shared test utilities for integration tests
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use tempfile::TempDir;
use vta_chat::client::{AudioClip, Backend, UploadFile};
use vta_chat::error::ClientError;
use vta_chat::models::api::{AudioResponse, QueryResponse};
use vta_chat::models::{ChatSession, Manual, Message, SourceNode};
use vta_chat::session::{SessionStore, SharedStorage, TokenScope, shared};
use vta_chat::storage::LocalStorage;

/// One backend call as seen by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login { email: String },
    AdminLogin { email: String },
    Register { email: String },
    Query { token: String, query: String, thread_id: String },
    History { thread_id: String },
    Sessions { token: String },
    NewSession,
    Audio { thread_id: String, bytes: usize },
    ListDocuments { token: String },
    Upload { file_name: String, mime: String },
}

type Script<T> = Mutex<VecDeque<Result<T, ClientError>>>;

/// Backend that records every call and answers from per-endpoint scripts
///
/// An empty script falls back to a plausible success.
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    tokens: Script<String>,
    registrations: Script<()>,
    answers: Script<QueryResponse>,
    histories: Script<Vec<Message>>,
    sessions: Script<Vec<ChatSession>>,
    new_sessions: Script<String>,
    audio: Script<AudioResponse>,
    documents: Script<Vec<Manual>>,
    uploads: Script<Manual>,
}

fn next<T>(
    script: &Script<T>,
    fallback: impl FnOnce() -> Result<T, ClientError>,
) -> Result<T, ClientError> {
    script.lock().unwrap().pop_front().unwrap_or_else(fallback)
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn push_token(&self, result: Result<String, ClientError>) -> &Self {
        self.tokens.lock().unwrap().push_back(result);
        self
    }

    pub fn push_registration(&self, result: Result<(), ClientError>) -> &Self {
        self.registrations.lock().unwrap().push_back(result);
        self
    }

    pub fn push_answer(&self, result: Result<QueryResponse, ClientError>) -> &Self {
        self.answers.lock().unwrap().push_back(result);
        self
    }

    pub fn push_history(&self, result: Result<Vec<Message>, ClientError>) -> &Self {
        self.histories.lock().unwrap().push_back(result);
        self
    }

    pub fn push_sessions(&self, result: Result<Vec<ChatSession>, ClientError>) -> &Self {
        self.sessions.lock().unwrap().push_back(result);
        self
    }

    pub fn push_new_session(&self, result: Result<String, ClientError>) -> &Self {
        self.new_sessions.lock().unwrap().push_back(result);
        self
    }

    pub fn push_audio(&self, result: Result<AudioResponse, ClientError>) -> &Self {
        self.audio.lock().unwrap().push_back(result);
        self
    }

    pub fn push_documents(&self, result: Result<Vec<Manual>, ClientError>) -> &Self {
        self.documents.lock().unwrap().push_back(result);
        self
    }

    pub fn push_upload(&self, result: Result<Manual, ClientError>) -> &Self {
        self.uploads.lock().unwrap().push_back(result);
        self
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn login(&self, email: &str, _password: &str) -> Result<String, ClientError> {
        self.record(Call::Login { email: email.to_string() });
        next(&self.tokens, || Ok("user-token".to_string()))
    }

    async fn admin_login(&self, email: &str, _password: &str) -> Result<String, ClientError> {
        self.record(Call::AdminLogin { email: email.to_string() });
        next(&self.tokens, || Ok("admin-token".to_string()))
    }

    async fn register(&self, email: &str, _password: &str) -> Result<(), ClientError> {
        self.record(Call::Register { email: email.to_string() });
        next(&self.registrations, || Ok(()))
    }

    async fn query(
        &self,
        token: &str,
        query: &str,
        thread_id: &str,
    ) -> Result<QueryResponse, ClientError> {
        self.record(Call::Query {
            token: token.to_string(),
            query: query.to_string(),
            thread_id: thread_id.to_string(),
        });
        next(&self.answers, || Ok(answer("ok")))
    }

    async fn history(&self, _token: &str, thread_id: &str) -> Result<Vec<Message>, ClientError> {
        self.record(Call::History { thread_id: thread_id.to_string() });
        next(&self.histories, || Ok(Vec::new()))
    }

    async fn list_sessions(&self, token: &str) -> Result<Vec<ChatSession>, ClientError> {
        self.record(Call::Sessions { token: token.to_string() });
        next(&self.sessions, || Ok(Vec::new()))
    }

    async fn new_session(&self, _token: &str) -> Result<String, ClientError> {
        self.record(Call::NewSession);
        next(&self.new_sessions, || Ok("thread-new".to_string()))
    }

    async fn send_audio(
        &self,
        _token: &str,
        clip: AudioClip,
        thread_id: &str,
    ) -> Result<AudioResponse, ClientError> {
        self.record(Call::Audio { thread_id: thread_id.to_string(), bytes: clip.len() });
        next(&self.audio, || {
            Ok(AudioResponse {
                transcribed: "spoken".to_string(),
                answer: "heard".to_string(),
                source_nodes: Vec::new(),
            })
        })
    }

    async fn list_documents(&self, token: &str) -> Result<Vec<Manual>, ClientError> {
        self.record(Call::ListDocuments { token: token.to_string() });
        next(&self.documents, || Ok(Vec::new()))
    }

    async fn upload_document(&self, _token: &str, file: UploadFile) -> Result<Manual, ClientError> {
        self.record(Call::Upload { file_name: file.file_name.clone(), mime: file.mime.clone() });
        next(&self.uploads, || Ok(Manual { file_name: file.file_name }))
    }
}

pub fn answer(text: &str) -> QueryResponse {
    QueryResponse { answer: text.to_string(), source_nodes: Vec::new() }
}

pub fn answer_with_source(text: &str, excerpt: &str, score: &str) -> QueryResponse {
    QueryResponse {
        answer: text.to_string(),
        source_nodes: vec![SourceNode { text: excerpt.to_string(), score: score.to_string() }],
    }
}

pub fn chat_session(id: &str, title: &str) -> ChatSession {
    ChatSession {
        id: id.to_string(),
        title: title.to_string(),
        created_at: "2025-03-01T10:00:00Z".to_string(),
    }
}

pub fn server_error() -> ClientError {
    ClientError::Status { status: 500, detail: None }
}

pub fn unauthorized() -> ClientError {
    ClientError::Unauthorized { status: 401, detail: None }
}

/// Temporary data directory with a shared token store
pub struct TestStorage {
    dir: TempDir,
    storage: SharedStorage,
}

impl TestStorage {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let storage = shared(LocalStorage::open(dir.path()).expect("Failed to open storage"));
        Self { dir, storage }
    }

    /// Storage with a user token already persisted
    pub fn logged_in(token: &str) -> Self {
        let storage = Self::new();
        storage.storage.lock().unwrap().set_item("sessionId", token).unwrap();
        storage
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn shared(&self) -> SharedStorage {
        Arc::clone(&self.storage)
    }

    pub fn session(&self, scope: TokenScope) -> SessionStore {
        SessionStore::open(self.shared(), scope).expect("Failed to open session store")
    }
}

impl Default for TestStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// A request captured by [`CannedServer`]
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP/1.1 server on localhost that answers each connection with the next canned response
pub struct CannedServer {
    url: String,
    handle: Option<JoinHandle<Vec<RawRequest>>>,
}

impl CannedServer {
    /// `responses` are `(status, json body)` pairs, served in order
    pub fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind test server");
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = match listener.accept() {
                    Ok(conn) => conn,
                    Err(_) => break,
                };
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                seen.push(read_request(&mut reader));
                let response = format!(
                    "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
                let _ = stream.flush();
            }
            seen
        });
        Self { url, handle: Some(handle) }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Wait for every canned response to be served and return the captured requests
    pub fn finish(mut self) -> Vec<RawRequest> {
        self.handle.take().map(|h| h.join().unwrap()).unwrap_or_default()
    }
}

fn read_request(reader: &mut impl BufRead) -> RawRequest {
    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).unwrap();

    RawRequest { request_line: request_line.trim_end().to_string(), headers, body }
}
