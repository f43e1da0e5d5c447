//! Domain layer for storytime
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Story
//!
//! A [`Document`] is built by an authoring agent through a fixed set of
//! mutations: title, segments, section writes, research notes, citations.
//! Segments are addressed by title and the first match wins.
//!
//! ## Evaluation
//!
//! An [`EvaluationReport`] is bound to one finalized document and scores it
//! with two [`Proportion`] metrics (accuracy and citations), each with a
//! free-text justification.

pub mod core;
pub mod evaluation;
pub mod prompt;
pub mod providers;
pub mod session;
pub mod story;
pub mod tool;

// Re-export commonly used types
pub use core::{error::DomainError, model::Model};
pub use evaluation::{
    ConsistencyIssue, EvaluationReport, Metric, MetricKind, MetricUpdate, Proportion,
    ReportRecord, ReportStatus, Tally, UpdateOutcome,
};
pub use prompt::{AuthoringPromptTemplate, EvaluationPromptTemplate};
pub use providers::{GeneratedImage, ImageSize, SearchHit};
pub use session::{
    context::ConversationContext,
    response::{ContentBlock, LlmResponse, StopReason},
};
pub use story::{Document, DocumentRecord, SectionWrite, Segment, StoryLocation};
pub use tool::{
    entities::{ToolCall, ToolDefinition, ToolParameter, ToolSpec},
    traits::{DefaultToolValidator, ToolValidator},
    value_objects::{ToolError, ToolResult, ToolResultMetadata},
};
