//! Application layer for storytime
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ExecutionParams, SessionModels};
pub use ports::{
    content_provider::{ImageProvider, ProviderError, SearchProvider},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{GatewayError, LlmGateway, LlmSession, ToolResultMessage},
    progress::{NoProgress, SessionKind, SessionProgressNotifier},
    report_store::ReportStore,
    story_store::{DeleteStatus, StorageError, StorySummary, StoryStore},
    tool_schema::ToolSchemaPort,
};
pub use use_cases::authoring::{
    AuthorStoryInput, AuthorStoryUseCase, AuthoringOutcome, AuthoringSession, AuthoringState,
};
pub use use_cases::error::SessionError;
pub use use_cases::evaluation::{
    EvaluateStoryInput, EvaluateStoryUseCase, EvaluationOutcome, EvaluationSession,
};
pub use use_cases::simulation::{
    CycleOutcome, CycleReport, CycleStage, FailurePolicy, SimulationConfig, SimulationError,
    SimulationHarness, SimulationReport,
};
pub use use_cases::tool_loop::{LoopSummary, ToolSurface};
