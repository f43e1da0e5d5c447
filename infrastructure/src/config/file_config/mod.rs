//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Every section uses `#[serde(default)]`, so any subset of keys is valid.

mod agent;
mod issue;
mod logging;
mod models;
mod providers;
mod simulation;
mod storage;

pub use agent::FileAgentConfig;
pub use issue::{ConfigIssue, Severity};
pub use logging::FileLoggingConfig;
pub use models::FileModelsConfig;
pub use providers::{FileOpenAiConfig, FilePerplexityConfig, FileProvidersConfig};
pub use simulation::FileSimulationConfig;
pub use storage::FileStorageConfig;

use serde::{Deserialize, Serialize};
use storytime_application::{ExecutionParams, SimulationConfig};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Model per session role
    pub models: FileModelsConfig,
    /// Tool loop settings
    pub agent: FileAgentConfig,
    /// Where stories and reports are written
    pub storage: FileStorageConfig,
    /// Simulation harness defaults
    pub simulation: FileSimulationConfig,
    /// External API settings
    pub providers: FileProvidersConfig,
    /// File logging and conversation transcripts
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Issues never stop the program: invalid values fall back to their
    /// defaults and the caller reports the issues as warnings.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.models.validate());
        issues.extend(self.agent.validate());
        issues.extend(self.simulation.parse_failure_policy().1);
        if self.providers.perplexity.max_results == 0 {
            issues.push(ConfigIssue::warning(
                "providers.perplexity.max_results",
                "must be at least 1, using 5",
            ));
        }
        issues
    }

    pub fn execution_params(&self) -> ExecutionParams {
        let search_max_results = match self.providers.perplexity.max_results {
            0 => ExecutionParams::default().search_max_results,
            n => n,
        };
        self.agent
            .to_execution_params()
            .with_search_max_results(search_max_results)
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig::default()
            .with_cycles(self.simulation.cycles)
            .with_keep_stories(self.simulation.keep_stories)
            .with_failure_policy(self.simulation.parse_failure_policy().0)
            .with_models(self.models.to_session_models())
            .with_execution(self.execution_params())
    }
}
