//! Admin document registry.
//!
//! Independent of the chat flow: an admin token (separate storage key) authorizes listing and
//! uploading the PDF manuals held by the backend's vector database.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::client::{Backend, UploadFile};
use crate::error::ClientError;
use crate::models::Manual;
use crate::notify::{self, Notification};
use crate::session::{self, SessionStore, TokenScope};

pub const PDF_MIME: &str = "application/pdf";

/// True when the file name maps to `application/pdf`
pub fn is_pdf(path: &Path) -> bool {
    mime_guess::from_path(path).iter_raw().any(|mime| mime == PDF_MIME)
}

/// Notification for a failed listing; authorization failures get a re-login hint
pub fn list_failure(err: &ClientError) -> Notification {
    if err.is_unauthorized() {
        Notification::error("Error", notify::FILES_UNAUTHORIZED)
    } else {
        Notification::error("Error", notify::FILES_FAILED)
    }
}

/// Notification for a failed upload; the backend's detail wins when present
pub fn upload_failure(err: &ClientError) -> Notification {
    Notification::error("Error", err.detail().unwrap_or(notify::UPLOAD_FAILED))
}

pub struct DocumentRegistry {
    backend: Arc<dyn Backend>,
    session: SessionStore,
    files: Vec<Manual>,
    /// Inline error of the last listing attempt; cleared on retry
    error: Option<String>,
}

impl DocumentRegistry {
    pub fn new(backend: Arc<dyn Backend>, session: SessionStore) -> Self {
        debug_assert_eq!(session.scope(), TokenScope::Admin);
        Self { backend, session, files: Vec::new(), error: None }
    }

    pub fn files(&self) -> &[Manual] {
        &self.files
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Notification {
        let backend = Arc::clone(&self.backend);
        match self.session.login(backend.as_ref(), email, password).await {
            Ok(()) => {
                self.files.clear();
                Notification::success("Login Successful", "Admin token stored.")
            }
            Err(e) => {
                warn!(error = %e, "admin login failed");
                session::admin_auth_failure(&e)
            }
        }
    }

    pub fn logout(&mut self) -> anyhow::Result<()> {
        self.session.logout()?;
        self.files.clear();
        self.error = None;
        Ok(())
    }

    fn token(&self) -> Result<String, Notification> {
        self.session
            .current_token()
            .map(str::to_string)
            .ok_or_else(|| Notification::error("Log In", notify::ADMIN_LOGIN_REQUIRED))
    }

    /// `GET /documents/list`; also serves as the manual retry
    pub async fn list(&mut self) -> Result<&[Manual], Notification> {
        let token = self.token()?;
        self.error = None;
        match self.backend.list_documents(&token).await {
            Ok(files) => {
                self.files = files;
                Ok(&self.files)
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch documents");
                let note = list_failure(&e);
                self.error = Some(note.description.clone());
                Err(note)
            }
        }
    }

    /// `POST /documents/upload`; non-PDF files are rejected before any request
    pub async fn upload(&mut self, path: &Path) -> Result<Manual, Notification> {
        if !is_pdf(path) {
            return Err(Notification::error("Error", notify::PDF_ONLY));
        }
        let token = self.token()?;
        let bytes = fs::read(path).map_err(|e| {
            Notification::error("Error", format!("Failed to read {}: {}", path.display(), e))
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        let file = UploadFile { file_name, mime: PDF_MIME.to_string(), bytes };
        match self.backend.upload_document(&token, file).await {
            Ok(manual) => {
                info!(file = %manual.file_name, "document uploaded");
                self.files.push(manual.clone());
                Ok(manual)
            }
            Err(e) => {
                warn!(error = %e, "upload failed");
                Err(upload_failure(&e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_is_pdf_by_extension() {
        assert!(is_pdf(&PathBuf::from("manual.pdf")));
        assert!(is_pdf(&PathBuf::from("/tmp/MANUAL.PDF")));
        assert!(!is_pdf(&PathBuf::from("notes.txt")));
        assert!(!is_pdf(&PathBuf::from("scan.png")));
        assert!(!is_pdf(&PathBuf::from("no_extension")));
    }

    #[test]
    fn test_list_failure_distinguishes_authorization() {
        let unauthorized = list_failure(&ClientError::from_status(401, ""));
        let forbidden = list_failure(&ClientError::from_status(403, ""));
        let generic = list_failure(&ClientError::from_status(500, ""));

        assert_eq!(unauthorized.description, notify::FILES_UNAUTHORIZED);
        assert_eq!(forbidden.description, notify::FILES_UNAUTHORIZED);
        assert_eq!(generic.description, notify::FILES_FAILED);
        assert_ne!(unauthorized.description, generic.description);
    }

    #[test]
    fn test_upload_failure_uses_detail() {
        let err = ClientError::from_status(400, r#"{"detail":"Document already indexed"}"#);
        assert_eq!(upload_failure(&err).description, "Document already indexed");
        assert_eq!(
            upload_failure(&ClientError::from_status(500, "oops")).description,
            notify::UPLOAD_FAILED
        );
    }
}
