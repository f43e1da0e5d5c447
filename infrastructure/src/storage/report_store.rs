//! Evaluation report store backed by a directory of JSON files.

use super::write_pretty;
use std::path::{Path, PathBuf};
use storytime_application::ports::report_store::ReportStore;
use storytime_application::ports::story_store::StorageError;
use storytime_domain::ReportRecord;
use storytime_domain::story::location::validate_component;
use tracing::debug;

pub struct JsonReportStore {
    dir: PathBuf,
}

impl JsonReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ReportStore for JsonReportStore {
    fn save(&self, name: &str, report: &ReportRecord) -> Result<PathBuf, StorageError> {
        validate_component(name, "Report name")?;
        let path = self.dir.join(format!("{}.json", name));
        write_pretty(&path, report)?;
        debug!("Saved evaluation report {}", path.display());
        Ok(path)
    }
}
