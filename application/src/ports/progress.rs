//! Progress notification port
//!
//! Defines the interface for reporting progress while sessions and
//! simulation cycles run. Implementations live in the presentation layer.

use crate::use_cases::authoring::AuthoringState;

/// Which kind of session is reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Authoring,
    Evaluation,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Authoring => "authoring",
            SessionKind::Evaluation => "evaluation",
        }
    }
}

impl std::fmt::Display for SessionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Callbacks for session and simulation progress.
///
/// All methods have default no-op implementations, so implementers only
/// need to override the callbacks they care about.
pub trait SessionProgressNotifier: Send + Sync {
    fn on_session_start(&self, _kind: SessionKind, _label: &str) {}

    /// Called before each tool turn (1-based).
    fn on_tool_turn(&self, _kind: SessionKind, _turn: usize, _max_turns: usize) {}

    fn on_tool_call(&self, _tool_name: &str, _args_preview: &str) {}

    fn on_tool_result(&self, _tool_name: &str, _success: bool, _preview: &str) {}

    /// Text the model produced alongside or instead of tool calls.
    fn on_llm_text(&self, _text: &str) {}

    fn on_authoring_state(&self, _state: AuthoringState) {}

    fn on_session_end(&self, _kind: SessionKind, _turns: usize) {}

    // ==================== Simulation Callbacks ====================

    /// `index` counts from zero, matching the story location of the cycle.
    fn on_cycle_start(&self, _index: usize, _total: usize) {}

    fn on_cycle_end(&self, _index: usize, _success: bool, _summary: &str) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl SessionProgressNotifier for NoProgress {}
