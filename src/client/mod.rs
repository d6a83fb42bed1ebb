//! Backend access.
//!
//! [`Backend`] is the full REST surface the client consumes. [`HttpBackend`] talks to the real
//! service; everything above this module only sees the trait, so tests can script responses
//! without a network.

pub mod http;

use async_trait::async_trait;

pub use http::HttpBackend;

use crate::error::ClientError;
use crate::models::api::{AudioResponse, QueryResponse};
use crate::models::{ChatSession, Manual, Message};

/// A finished recording ready for `/chat/audio`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    /// True when capture hit the size bound and later chunks were dropped
    pub truncated: bool,
}

impl AudioClip {
    pub const FILE_NAME: &'static str = "recording.wav";
    pub const MIME: &'static str = "audio/wav";

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A local document for `/documents/upload`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// `POST /auth/token`
    async fn login(&self, email: &str, password: &str) -> Result<String, ClientError>;

    /// `POST /auth/admin/token`
    async fn admin_login(&self, email: &str, password: &str) -> Result<String, ClientError>;

    /// `POST /auth/register`
    async fn register(&self, email: &str, password: &str) -> Result<(), ClientError>;

    /// `POST /chat/query`
    async fn query(
        &self,
        token: &str,
        query: &str,
        thread_id: &str,
    ) -> Result<QueryResponse, ClientError>;

    /// `POST /chat/history`
    async fn history(&self, token: &str, thread_id: &str) -> Result<Vec<Message>, ClientError>;

    /// `GET /chat/sessions`
    async fn list_sessions(&self, token: &str) -> Result<Vec<ChatSession>, ClientError>;

    /// `GET /chat/new-session`, returning the new thread id
    async fn new_session(&self, token: &str) -> Result<String, ClientError>;

    /// `POST /chat/audio`
    async fn send_audio(
        &self,
        token: &str,
        clip: AudioClip,
        thread_id: &str,
    ) -> Result<AudioResponse, ClientError>;

    /// `GET /documents/list`
    async fn list_documents(&self, token: &str) -> Result<Vec<Manual>, ClientError>;

    /// `POST /documents/upload`
    async fn upload_document(&self, token: &str, file: UploadFile) -> Result<Manual, ClientError>;
}
