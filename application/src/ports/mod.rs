//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod content_provider;
pub mod conversation_logger;
pub mod llm_gateway;
pub mod progress;
pub mod report_store;
pub mod story_store;
pub mod tool_schema;
