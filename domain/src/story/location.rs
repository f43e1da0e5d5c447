//! Logical storage name of a story.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Stable logical name of a story, used to derive every persistence path.
///
/// Set once when a [`Document`](super::Document) is created and never
/// changed. The name is a bare file stem: it can never contain a path
/// separator, so derived file names always stay inside the storage directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryLocation(String);

impl StoryLocation {
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        validate_component(&name, "Story location")?;
        Ok(Self(name))
    }

    /// Derive a location from a free-form topic.
    ///
    /// Lower-cases ASCII alphanumerics and collapses every other run of
    /// characters into a single `_`.
    pub fn from_topic(topic: &str) -> Self {
        let mut slug = String::with_capacity(topic.len());
        let mut pending_sep = false;
        for ch in topic.chars() {
            if ch.is_ascii_alphanumeric() {
                if pending_sep && !slug.is_empty() {
                    slug.push('_');
                }
                pending_sep = false;
                slug.push(ch.to_ascii_lowercase());
            } else {
                pending_sep = true;
            }
        }
        if slug.is_empty() {
            slug.push_str("story");
        }
        Self(slug)
    }

    /// Location for one simulation cycle: `simulation_story_<index>_<unix_seconds>`.
    pub fn simulation(index: usize, unix_seconds: i64) -> Self {
        Self(format!("simulation_story_{}_{}", index, unix_seconds))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the base story file.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }

    /// File name of a versioned snapshot: `<base>-<label>.json`.
    pub fn version_file_name(&self, label: &str) -> Result<String, DomainError> {
        validate_component(label, "Version label")?;
        Ok(format!("{}-{}.json", self.0, label))
    }
}

impl std::fmt::Display for StoryLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validate a single file-name component (story name, version label, report name).
pub fn validate_component(value: &str, what: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{} must be provided", what)));
    }
    if value.contains('/') || value.contains('\\') || value.contains("..") {
        return Err(DomainError::validation(format!(
            "{} '{}' must not contain path separators",
            what, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_and_paths() {
        assert!(StoryLocation::new("").is_err());
        assert!(StoryLocation::new("  ").is_err());
        assert!(StoryLocation::new("../etc").is_err());
        assert!(StoryLocation::new("a/b").is_err());
        assert!(StoryLocation::new("printing_press").is_ok());
    }

    #[test]
    fn test_from_topic_slug() {
        let loc = StoryLocation::from_topic("History of the Printing Press!");
        assert_eq!(loc.as_str(), "history_of_the_printing_press");
    }

    #[test]
    fn test_from_topic_without_alphanumerics() {
        assert_eq!(StoryLocation::from_topic("?!").as_str(), "story");
    }

    #[test]
    fn test_file_names() {
        let loc = StoryLocation::new("press").unwrap();
        assert_eq!(loc.file_name(), "press.json");
        assert_eq!(loc.version_file_name("v1").unwrap(), "press-v1.json");
        assert!(loc.version_file_name("").is_err());
        assert!(loc.version_file_name("../v1").is_err());
    }

    #[test]
    fn test_simulation_location() {
        let loc = StoryLocation::simulation(3, 1_700_000_000);
        assert_eq!(loc.as_str(), "simulation_story_3_1700000000");
    }
}
