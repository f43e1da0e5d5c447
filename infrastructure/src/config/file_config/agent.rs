//! Tool loop configuration from TOML (`[agent]` section)

use super::ConfigIssue;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use storytime_application::ExecutionParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    /// Maximum tool turns per session (default: 40)
    pub max_tool_turns: usize,
    /// Per-call LLM timeout in seconds; 0 disables the timeout (default: 300)
    pub llm_timeout_secs: u64,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        Self {
            max_tool_turns: 40,
            llm_timeout_secs: 300,
        }
    }
}

impl FileAgentConfig {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.max_tool_turns == 0 {
            issues.push(ConfigIssue::warning(
                "agent.max_tool_turns",
                "must be at least 1, using 40",
            ));
        }
        issues
    }

    pub fn to_execution_params(&self) -> ExecutionParams {
        let defaults = ExecutionParams::default();
        let max_tool_turns = match self.max_tool_turns {
            0 => defaults.max_tool_turns,
            n => n,
        };
        let timeout = match self.llm_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        defaults
            .with_max_tool_turns(max_tool_turns)
            .with_llm_timeout(timeout)
    }
}
