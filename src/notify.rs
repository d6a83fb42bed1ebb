//! Transient user-facing notifications.
//!
//! Components never print; they hand back a [`Notification`] and the outer surface decides
//! how to show it (stderr line for CLI subcommands, status bar for the TUI).

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub level: Level,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), level: Level::Success }
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), level: Level::Info }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), level: Level::Error }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }

    /// Shown whenever a chat action needs a token and none is stored
    pub fn login_required() -> Self {
        Self::error(LOGIN_REQUIRED_TITLE, LOGIN_REQUIRED)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

pub const LOGIN_REQUIRED_TITLE: &str = "Log In";
pub const LOGIN_REQUIRED: &str = "Please log in or register to use the chatbot.";
pub const AUTH_FAILED: &str = "Failed to authenticate. Please try again.";
pub const ADMIN_AUTH_FAILED: &str = "Invalid credentials or not an admin";
pub const LOGIN_SUCCESS: &str = "You have successfully logged in.";
pub const REGISTER_SUCCESS: &str = "You have successfully registered and logged in.";
pub const QUERY_APOLOGY: &str = "Sorry, I encountered an error while processing your request.";
pub const QUERY_FAILED: &str = "Failed to get an answer from the assistant.";
pub const SESSIONS_FAILED: &str = "Failed to load chat sessions";
pub const HISTORY_FAILED: &str = "Failed to load chat history";
pub const NEW_CHAT_FAILED: &str = "Failed to create new chat";
pub const RECORDING_FAILED: &str =
    "Failed to start recording. Please check your microphone permissions.";
pub const AUDIO_FAILED: &str = "Failed to process audio. Please try again.";
pub const PDF_ONLY: &str = "Only PDF files are accepted.";
pub const UPLOAD_SUCCESS: &str = "File uploaded successfully to vector database.";
pub const UPLOAD_FAILED: &str = "Upload failed";
pub const FILES_FAILED: &str = "Failed to fetch files. Please try again.";
pub const FILES_UNAUTHORIZED: &str =
    "Your admin session has expired or is not authorized. Please log in again.";
pub const ADMIN_LOGIN_REQUIRED: &str = "Please log in as an admin first.";
