//! Infrastructure layer for storytime
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: provider clients, JSON storage, tool schema
//! conversion, conversation logging and configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;
pub mod storage;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigError, ConfigIssue, ConfigLoader, FileConfig, Severity};
pub use logging::JsonlConversationLogger;
pub use providers::{OpenAiGateway, OpenAiImageGenerator, OpenAiSession, PerplexitySearch};
pub use storage::{JsonReportStore, JsonStoryStore};
pub use tools::JsonSchemaToolConverter;
