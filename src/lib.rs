//! VTA Chat - terminal client for the Virtual Technical Assistant
//!
//! The assistant's retrieval, inference and transcription all live in an external backend
//! reached over REST. This library holds the client side of that conversation:
//!
//! - Persisting the end-user and admin access tokens in a local key/value store
//! - Keeping the list of the user's chat threads and the active thread
//! - Reconciling a thread's transcript with optimistic sends, replies and history reloads,
//!   discarding responses that arrive for a thread that is no longer displayed
//! - Recording a spoken question and splicing its transcript and answer into the chat
//! - Listing and uploading the PDF manuals behind the assistant (admin)
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use vta_chat::{ChatController, HttpBackend, LocalStorage, SessionStore, TokenScope};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let storage = vta_chat::session::shared(LocalStorage::open("/tmp/vta".as_ref())?);
//! let session = SessionStore::open(storage, TokenScope::User)?;
//! let backend = HttpBackend::new("http://localhost:8000", Duration::from_secs(60))?;
//! let mut chat = ChatController::new(Arc::new(backend), session);
//!
//! let actions = chat.submit("How do I bleed the brakes?");
//! for note in chat.run(actions).await {
//!     eprintln!("{}", note);
//! }
//! # Ok(())
//! # }
//! ```

pub mod admin;
pub mod chat;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod notify;
pub mod session;
pub mod storage;
pub mod tui;
pub mod utils;

// Re-export commonly used types
pub use admin::DocumentRegistry;
pub use chat::ChatController;
pub use client::{Backend, HttpBackend};
pub use config::Config;
pub use error::ClientError;
pub use notify::Notification;
pub use session::{SessionStore, TokenScope};
pub use storage::LocalStorage;
pub use utils::format_path_with_tilde;
