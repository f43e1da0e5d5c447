//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Both variants are recoverable from the agent's point of view: the tool
/// layer renders them as text so the model can correct itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Segment '{0}' not found")]
    SegmentNotFound(String),

    #[error("{0}")]
    Validation(String),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }

    /// Check if this error refers to a missing segment
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::SegmentNotFound(_))
    }
}
