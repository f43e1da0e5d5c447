//! Execution parameters: session loop control.
//!
//! [`ExecutionParams`] groups the static parameters that bound the tool
//! loop shared by the authoring and evaluation sessions. These are
//! application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tool loop control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Maximum tool use turns in one session.
    pub max_tool_turns: usize,
    /// Number of hits requested per web search.
    pub search_max_results: usize,
    /// Upper bound on a single model round trip.
    pub llm_timeout: Option<Duration>,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            max_tool_turns: 40,
            search_max_results: 5,
            llm_timeout: Some(Duration::from_secs(300)),
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_max_tool_turns(mut self, max: usize) -> Self {
        self.max_tool_turns = max;
        self
    }

    pub fn with_search_max_results(mut self, max: usize) -> Self {
        self.search_max_results = max;
        self
    }

    pub fn with_llm_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.llm_timeout = timeout;
        self
    }
}
