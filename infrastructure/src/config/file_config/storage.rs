//! Storage configuration from TOML (`[storage]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// Story directory (default: "stories/json_storage")
    pub story_dir: String,
    /// Evaluation report directory (default: "evaluations/json_storage")
    pub evaluation_dir: String,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            story_dir: "stories/json_storage".to_string(),
            evaluation_dir: "evaluations/json_storage".to_string(),
        }
    }
}
