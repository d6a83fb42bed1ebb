//! Session store: the persisted bearer token for one scope.
//!
//! End users and admins use separate storage keys so both can be logged in side by side.
//! "Logged in" means exactly "a token is stored"; there is no expiry tracking on the client.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use tracing::info;

use crate::client::Backend;
use crate::error::ClientError;
use crate::notify::{self, Notification};
use crate::storage::LocalStorage;

/// Storage shared by every [`SessionStore`] of the process
pub type SharedStorage = Arc<Mutex<LocalStorage>>;

pub fn shared(storage: LocalStorage) -> SharedStorage {
    Arc::new(Mutex::new(storage))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    User,
    Admin,
}

impl TokenScope {
    pub fn storage_key(self) -> &'static str {
        match self {
            TokenScope::User => "sessionId",
            TokenScope::Admin => "adminToken",
        }
    }
}

#[derive(Debug)]
pub struct SessionStore {
    storage: SharedStorage,
    scope: TokenScope,
    token: Option<String>,
}

impl SessionStore {
    /// Read the persisted token for `scope`, if any
    pub fn open(storage: SharedStorage, scope: TokenScope) -> Result<Self> {
        let token = lock(&storage)?.get_item(scope.storage_key()).map(str::to_string);
        Ok(Self { storage, scope, token })
    }

    pub fn scope(&self) -> TokenScope {
        self.scope
    }

    pub fn current_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    /// Exchange credentials for a token and persist it
    pub async fn login(
        &mut self,
        backend: &dyn Backend,
        email: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        let token = match self.scope {
            TokenScope::User => backend.login(email, password).await?,
            TokenScope::Admin => backend.admin_login(email, password).await?,
        };
        self.store(token)?;
        info!(scope = ?self.scope, "logged in");
        Ok(())
    }

    /// Create an end-user account, then log in with the same credentials
    pub async fn register(
        &mut self,
        backend: &dyn Backend,
        email: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        if self.scope != TokenScope::User {
            return Err(ClientError::Validation("Only end users can register".to_string()));
        }
        backend.register(email, password).await?;
        self.login(backend, email, password).await
    }

    /// Forget the token; later authenticated actions are rejected until the next login
    pub fn logout(&mut self) -> Result<()> {
        lock(&self.storage)?.remove_item(self.scope.storage_key())?;
        self.token = None;
        info!(scope = ?self.scope, "logged out");
        Ok(())
    }

    fn store(&mut self, token: String) -> Result<()> {
        lock(&self.storage)?.set_item(self.scope.storage_key(), &token)?;
        self.token = Some(token);
        Ok(())
    }
}

fn lock(storage: &SharedStorage) -> Result<MutexGuard<'_, LocalStorage>> {
    storage.lock().map_err(|_| anyhow!("storage lock poisoned"))
}

/// Notification for a failed end-user login or registration
pub fn auth_failure(err: &ClientError) -> Notification {
    match err {
        ClientError::Storage(reason) => Notification::error("Error", reason.clone()),
        _ => Notification::error("Error", notify::AUTH_FAILED),
    }
}

/// Notification for a failed admin login; the backend's detail wins when present
pub fn admin_auth_failure(err: &ClientError) -> Notification {
    let description = match err {
        ClientError::MissingToken => err.to_string(),
        ClientError::Storage(reason) => reason.clone(),
        other => other.detail().unwrap_or(notify::ADMIN_AUTH_FAILED).to_string(),
    };
    Notification::error("Authentication Error", description)
}
