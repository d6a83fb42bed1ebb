//! Data models for the chat backend.
//!
//! - [`Message`] and [`SourceNode`] - One entry of a thread transcript and its citations
//! - [`ChatSession`] - A resumable conversation thread owned by the user
//! - [`Manual`] - A document stored in the backend's vector database
//! - [`api`] - Request and response bodies of the REST surface
//!
//! Lenient field decoding (scores as numbers or strings, nullable lists) lives in
//! the `deserializers` module.

pub mod api;
pub mod deserializers;
pub mod document;
pub mod message;
pub mod session;

pub use document::Manual;
pub use message::{Message, Role, SourceNode};
pub use session::ChatSession;
