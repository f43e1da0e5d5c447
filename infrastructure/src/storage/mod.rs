//! JSON file persistence for stories and evaluation reports.
//!
//! ```text
//! <story_dir>/<base>.json
//! <story_dir>/<base>-<version>.json
//! <evaluation_dir>/<name>.json
//! ```
//!
//! Directories are created on first write. Files are pretty-printed.

mod report_store;
mod story_store;

pub use report_store::JsonReportStore;
pub use story_store::JsonStoryStore;

use std::path::Path;
use storytime_application::ports::story_store::StorageError;

fn write_pretty<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|e| StorageError::io(path, e))
}
