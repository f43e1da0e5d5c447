//! Story store backed by a directory of JSON files.

use super::write_pretty;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use storytime_application::ports::story_store::{
    DeleteStatus, StorageError, StorySummary, StoryStore,
};
use storytime_domain::story::location::validate_component;
use storytime_domain::{Document, DocumentRecord, StoryLocation};
use tracing::{debug, warn};

pub struct JsonStoryStore {
    dir: PathBuf,
}

impl JsonStoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read a story file into a [`Document`] located at the file's stem.
    ///
    /// Used to evaluate a previously saved story. Citations are not part of
    /// the file format and come back empty.
    pub fn read_document(path: &Path) -> Result<Document, StorageError> {
        let raw = std::fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
        let record: DocumentRecord = serde_json::from_str(&raw)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| StorageError::InvalidName(path.display().to_string()))?;
        Ok(Document::from_record(StoryLocation::new(stem)?, record))
    }

    fn json_files(&self) -> Result<Vec<PathBuf>, StorageError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(&self.dir, e)),
        };

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StorageError::io(&self.dir, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn summarize(path: &Path) -> Option<StorySummary> {
        let filename = path.file_name()?.to_str()?.to_string();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Skipping unreadable story {}: {}", path.display(), e);
                return None;
            }
        };
        let record: DocumentRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unparsable story {}: {}", path.display(), e);
                return None;
            }
        };
        let modified_at = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Some(StorySummary {
            filename,
            title: if record.title.is_empty() {
                "Untitled".to_string()
            } else {
                record.title.clone()
            },
            modified_at,
            thumbnail: record.thumbnail().map(str::to_string),
        })
    }
}

impl StoryStore for JsonStoryStore {
    fn save_version(&self, document: &Document, label: &str) -> Result<PathBuf, StorageError> {
        let path = self
            .dir
            .join(document.location().version_file_name(label)?);
        write_pretty(&path, &document.serialize())?;
        debug!("Saved story snapshot {}", path.display());
        Ok(path)
    }

    fn delete(&self, location: &StoryLocation) -> Result<DeleteStatus, StorageError> {
        let path = self.dir.join(location.file_name());
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(DeleteStatus::Deleted(path)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(DeleteStatus::Absent(path)),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    fn purge_versions(
        &self,
        location: &StoryLocation,
        labels: &[String],
    ) -> Result<usize, StorageError> {
        let mut removed = 0;
        for label in labels {
            let path = self.dir.join(location.version_file_name(label)?);
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::io(path, e)),
            }
        }
        Ok(removed)
    }

    fn list(&self) -> Result<Vec<StorySummary>, StorageError> {
        let mut stories: Vec<StorySummary> = self
            .json_files()?
            .iter()
            .filter_map(|p| Self::summarize(p))
            .collect();
        stories.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(stories)
    }

    fn load(&self, filename: &str) -> Result<Option<String>, StorageError> {
        validate_component(filename, "Story file name")?;
        let path = self.dir.join(filename);
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }
}
