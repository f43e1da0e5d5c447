//! Role-based model configuration from TOML (`[models]` section)

use super::ConfigIssue;
use serde::{Deserialize, Serialize};
use storytime_application::SessionModels;
use storytime_domain::Model;

/// Role-based model configuration from TOML
///
/// # Example
///
/// ```toml
/// [models]
/// author = "gpt-4o-mini"      # Authoring session
/// evaluator = "gpt-4o-mini"   # Evaluation session
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    pub author: Option<String>,
    pub evaluator: Option<String>,
}

impl FileModelsConfig {
    fn parse(field: &str, value: Option<&String>) -> (Option<Model>, Option<ConfigIssue>) {
        match value {
            None => (None, None),
            Some(s) if s.trim().is_empty() => (
                None,
                Some(ConfigIssue::error(
                    format!("models.{}", field),
                    "model name cannot be empty",
                )),
            ),
            Some(s) => match s.parse::<Model>() {
                Ok(model) => (Some(model), None),
                Err(never) => match never {},
            },
        }
    }

    pub fn parse_author(&self) -> Option<Model> {
        Self::parse("author", self.author.as_ref()).0
    }

    pub fn parse_evaluator(&self) -> Option<Model> {
        Self::parse("evaluator", self.evaluator.as_ref()).0
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        [
            Self::parse("author", self.author.as_ref()).1,
            Self::parse("evaluator", self.evaluator.as_ref()).1,
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Unset or invalid entries fall back to [`Model::default`].
    pub fn to_session_models(&self) -> SessionModels {
        SessionModels::default()
            .with_author(self.parse_author().unwrap_or_default())
            .with_evaluator(self.parse_evaluator().unwrap_or_default())
    }
}
