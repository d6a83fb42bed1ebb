//! Runtime configuration.
//!
//! Values come from command-line flags, falling back to environment variables (see
//! [`crate::cli::GlobalArgs`]) and then to the defaults below.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use crate::utils::default_data_dir;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";
pub const DEFAULT_RECORD_COMMAND: &str = "arecord -q -f S16_LE -r 16000 -c 1 -t wav";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const LOG_FILENAME: &str = "vta-chat.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server_url: String,
    pub data_dir: PathBuf,
    pub record_command: String,
    pub timeout: Duration,
}

impl Config {
    pub fn new(
        server_url: Option<String>,
        data_dir: Option<PathBuf>,
        record_command: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        Ok(Self {
            server_url: server_url
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            data_dir,
            record_command: record_command
                .filter(|cmd| !cmd.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_RECORD_COMMAND.to_string()),
            timeout: Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS).max(1)),
        })
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILENAME)
    }
}
