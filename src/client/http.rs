use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{AudioClip, Backend, UploadFile};
use crate::error::ClientError;
use crate::models::api::{
    AudioResponse, HistoryRequest, HistoryResponse, LoginForm, ManualsResponse,
    NewSessionResponse, QueryRequest, QueryResponse, RegisterRequest, SessionsResponse,
    TokenResponse, UploadResponse,
};
use crate::models::{ChatSession, Manual, Message};

/// reqwest-backed client for the chat backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "backend request");
        self.client.request(method, self.url(path))
    }

    /// Request carrying `Authorization: Bearer <token>`
    pub(crate) fn authorized(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.request(method, path).bearer_auth(token)
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response = Self::check(request).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn check(request: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ClientError::from_status(status.as_u16(), &body);
        warn!(status = status.as_u16(), error = %err, "backend rejected request");
        Err(err)
    }

    async fn token(&self, path: &str, email: &str, password: &str) -> Result<String, ClientError> {
        let request =
            self.request(Method::POST, path).form(&LoginForm { username: email, password });
        let response: TokenResponse = Self::send_json(request).await?;
        match response.access_token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(ClientError::MissingToken),
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn login(&self, email: &str, password: &str) -> Result<String, ClientError> {
        self.token("/auth/token", email, password).await
    }

    async fn admin_login(&self, email: &str, password: &str) -> Result<String, ClientError> {
        self.token("/auth/admin/token", email, password).await
    }

    async fn register(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let request = self.request(Method::POST, "/auth/register").json(&RegisterRequest {
            username: email,
            email,
            password,
            role: "user",
        });
        Self::check(request).await.map(|_| ())
    }

    async fn query(
        &self,
        token: &str,
        query: &str,
        thread_id: &str,
    ) -> Result<QueryResponse, ClientError> {
        let request = self
            .authorized(Method::POST, "/chat/query", token)
            .json(&QueryRequest { query, session_id: thread_id });
        Self::send_json(request).await
    }

    async fn history(&self, token: &str, thread_id: &str) -> Result<Vec<Message>, ClientError> {
        let request = self
            .authorized(Method::POST, "/chat/history", token)
            .json(&HistoryRequest { session_id: thread_id });
        let response: HistoryResponse = Self::send_json(request).await?;
        Ok(response.history)
    }

    async fn list_sessions(&self, token: &str) -> Result<Vec<ChatSession>, ClientError> {
        let request = self.authorized(Method::GET, "/chat/sessions", token);
        let response: SessionsResponse = Self::send_json(request).await?;
        Ok(response.sessions)
    }

    async fn new_session(&self, token: &str) -> Result<String, ClientError> {
        let request = self.authorized(Method::GET, "/chat/new-session", token);
        let response: NewSessionResponse = Self::send_json(request).await?;
        Ok(response.session_id)
    }

    async fn send_audio(
        &self,
        token: &str,
        clip: AudioClip,
        thread_id: &str,
    ) -> Result<AudioResponse, ClientError> {
        let part =
            Part::bytes(clip.bytes).file_name(AudioClip::FILE_NAME).mime_str(AudioClip::MIME)?;
        let form = Form::new().part("audio", part).text("session_id", thread_id.to_string());
        let request = self.authorized(Method::POST, "/chat/audio", token).multipart(form);
        Self::send_json(request).await
    }

    async fn list_documents(&self, token: &str) -> Result<Vec<Manual>, ClientError> {
        let request = self.authorized(Method::GET, "/documents/list", token);
        let response: ManualsResponse = Self::send_json(request).await?;
        Ok(response.manuals)
    }

    async fn upload_document(&self, token: &str, file: UploadFile) -> Result<Manual, ClientError> {
        let part = Part::bytes(file.bytes).file_name(file.file_name).mime_str(&file.mime)?;
        let form = Form::new().part("file", part);
        let request = self.authorized(Method::POST, "/documents/upload", token).multipart(form);
        let response: UploadResponse = Self::send_json(request).await?;
        Ok(Manual { file_name: response.file_name })
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::AUTHORIZATION;

    use super::*;

    fn backend() -> HttpBackend {
        HttpBackend::new("http://localhost:8000/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = backend();
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(backend.url("/chat/query"), "http://localhost:8000/chat/query");
    }

    #[test]
    fn test_authorized_request_carries_bearer_token() {
        let request =
            backend().authorized(Method::GET, "/chat/sessions", "tok-123").build().unwrap();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.url().as_str(), "http://localhost:8000/chat/sessions");
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer tok-123");
    }

    #[test]
    fn test_login_form_is_url_encoded() {
        let request = backend()
            .request(Method::POST, "/auth/token")
            .form(&LoginForm { username: "a@b.com", password: "p&w" })
            .build()
            .unwrap();
        let body = request.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(std::str::from_utf8(body).unwrap(), "username=a%40b.com&password=p%26w");
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }
}
