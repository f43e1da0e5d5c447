//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for the daily rolling log file; empty disables file logging
    pub dir: String,
    /// Path of the JSONL conversation transcript; empty disables it
    pub conversation_log: String,
}

impl FileLoggingConfig {
    pub fn log_dir(&self) -> Option<&str> {
        Some(self.dir.as_str()).filter(|d| !d.trim().is_empty())
    }

    pub fn conversation_log_path(&self) -> Option<&str> {
        Some(self.conversation_log.as_str()).filter(|p| !p.trim().is_empty())
    }
}
