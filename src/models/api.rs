//! Request and response bodies of the backend REST surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ChatSession, Manual, Message, SourceNode};

/// Form body for `/auth/token` and `/auth/admin/token`
#[derive(Debug, Serialize)]
pub struct LoginForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// JSON body for `/auth/register`
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Error payload of a non-2xx response
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// `detail` as display text; validation error lists are rendered as JSON
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueryRequest<'a> {
    pub query: &'a str,
    pub session_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub answer: String,
    #[serde(default, deserialize_with = "super::deserializers::deserialize_nullable_list")]
    pub source_nodes: Vec<SourceNode>,
}

#[derive(Debug, Serialize)]
pub struct HistoryRequest<'a> {
    pub session_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    #[serde(default, deserialize_with = "super::deserializers::deserialize_nullable_list")]
    pub history: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct SessionsResponse {
    #[serde(default, deserialize_with = "super::deserializers::deserialize_nullable_list")]
    pub sessions: Vec<ChatSession>,
}

#[derive(Debug, Deserialize)]
pub struct NewSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioResponse {
    #[serde(default)]
    pub transcribed: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default, deserialize_with = "super::deserializers::deserialize_nullable_list")]
    pub source_nodes: Vec<SourceNode>,
}

#[derive(Debug, Deserialize)]
pub struct ManualsResponse {
    #[serde(default, deserialize_with = "super::deserializers::deserialize_lenient_list")]
    pub manuals: Vec<Manual>,
}

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub file_name: String,
}
