//! Errors that end an authoring or evaluation session.
//!
//! Tool failures never appear here: they are reported to the model as text.

use crate::ports::llm_gateway::GatewayError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Gateway error: {0}")]
    GatewayError(#[from] GatewayError),

    #[error("Model call timed out after {0:?}")]
    Timeout(Duration),

    #[error("No response from model")]
    EmptyResponse,

    #[error("Story has no title")]
    MissingTitle,
}
