//! Simulation configuration from TOML (`[simulation]` section)

use super::ConfigIssue;
use serde::{Deserialize, Serialize};
use storytime_application::FailurePolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSimulationConfig {
    /// Number of author/evaluate cycles (default: 10)
    pub cycles: usize,
    /// Keep story files after each cycle (default: false)
    pub keep_stories: bool,
    /// "continue" or "abort" (default: "continue")
    pub failure_policy: String,
}

impl Default for FileSimulationConfig {
    fn default() -> Self {
        Self {
            cycles: 10,
            keep_stories: false,
            failure_policy: "continue".to_string(),
        }
    }
}

impl FileSimulationConfig {
    /// Parse the failure policy, falling back to `Continue` with an issue.
    pub fn parse_failure_policy(&self) -> (FailurePolicy, Vec<ConfigIssue>) {
        match self.failure_policy.parse() {
            Ok(policy) => (policy, Vec::new()),
            Err(message) => (
                FailurePolicy::default(),
                vec![ConfigIssue::warning("simulation.failure_policy", message)],
            ),
        }
    }
}
