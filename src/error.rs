//! Failure taxonomy for backend calls and client-side validation.

use thiserror::Error;

use crate::models::api::ErrorBody;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, TLS or timeout failure before a status code was received
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 401 or 403
    #[error("not authorized (HTTP {status})")]
    Unauthorized { status: u16, detail: Option<String> },

    /// Any other non-2xx status, with the backend's `detail` when it sent one
    #[error("request failed (HTTP {status}){}", .detail.as_deref().map(|d| format!(": {}", d)).unwrap_or_default())]
    Status { status: u16, detail: Option<String> },

    /// 2xx whose body could not be decoded
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// Login succeeded without handing out a token
    #[error("No access token received")]
    MissingToken,

    /// Rejected locally; no request was issued
    #[error("{0}")]
    Validation(String),

    /// The token could not be written to or removed from local storage
    #[error("failed to persist session: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for ClientError {
    fn from(err: anyhow::Error) -> Self {
        ClientError::Storage(format!("{:#}", err))
    }
}

impl ClientError {
    /// Classify a non-2xx response from its status code and raw body
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ErrorBody>(body).ok().and_then(|b| b.detail_text());
        if status == 401 || status == 403 {
            ClientError::Unauthorized { status, detail }
        } else {
            ClientError::Status { status, detail }
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    /// Backend-provided detail, if the failure carried one
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Unauthorized { detail, .. } | ClientError::Status { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }
}
