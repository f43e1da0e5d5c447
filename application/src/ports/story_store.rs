//! Story persistence port.
//!
//! Stories are stored as one JSON file per snapshot under a story directory:
//! `<base>.json` for the base file and `<base>-<label>.json` per saved version.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use storytime_domain::{Document, DomainError, StoryLocation};
use thiserror::Error;

/// Errors from story and report persistence
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid name: {0}")]
    InvalidName(String),
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<DomainError> for StorageError {
    fn from(e: DomainError) -> Self {
        StorageError::InvalidName(e.to_string())
    }
}

/// Outcome of deleting a story's base file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteStatus {
    Deleted(PathBuf),
    Absent(PathBuf),
}

impl std::fmt::Display for DeleteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteStatus::Deleted(p) => write!(f, "deleted {}", p.display()),
            DeleteStatus::Absent(p) => write!(f, "not found {}", p.display()),
        }
    }
}

/// One entry of the story library listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorySummary {
    pub filename: String,
    pub title: String,
    pub modified_at: DateTime<Utc>,
    pub thumbnail: Option<String>,
}

/// Persistence for story documents.
pub trait StoryStore: Send + Sync {
    /// Write the document's serialized form as `<base>-<label>.json`.
    ///
    /// Saving again with the same label overwrites the same file.
    fn save_version(&self, document: &Document, label: &str) -> Result<PathBuf, StorageError>;

    /// Remove `<base>.json` if present.
    fn delete(&self, location: &StoryLocation) -> Result<DeleteStatus, StorageError>;

    /// Remove the `<base>-<label>.json` snapshot of each label; returns how
    /// many existed. Other stories sharing the name prefix are never touched.
    fn purge_versions(
        &self,
        location: &StoryLocation,
        labels: &[String],
    ) -> Result<usize, StorageError>;

    /// All stories, newest first.
    fn list(&self) -> Result<Vec<StorySummary>, StorageError>;

    /// Raw JSON of one story file, `None` if it does not exist.
    fn load(&self, filename: &str) -> Result<Option<String>, StorageError>;
}
