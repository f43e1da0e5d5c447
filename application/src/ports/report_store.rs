//! Evaluation report persistence port.

use super::story_store::StorageError;
use std::path::PathBuf;
use storytime_domain::ReportRecord;

pub trait ReportStore: Send + Sync {
    /// Write `<evaluation_dir>/<name>.json`, overwriting any previous file.
    fn save(&self, name: &str, report: &ReportRecord) -> Result<PathBuf, StorageError>;
}
