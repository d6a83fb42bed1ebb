//! Persistent key/value storage for session tokens
//!
//! A single JSON object of storage key to string value, kept in the platform data directory:
//! - macOS: `~/Library/Application Support/vta-chat/storage.json`
//! - Linux: `~/.local/share/vta-chat/storage.json`
//! - Windows: `%APPDATA%\vta-chat\storage.json`
//!
//! Every mutation is written through immediately using temp file + rename.

pub mod persistence;

pub use persistence::{LocalStorage, STORAGE_FILENAME};
