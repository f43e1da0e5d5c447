//! Tool domain module
//!
//! The vocabulary shared by the authoring and evaluation sessions for
//! exposing operations to a tool-calling model.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ ToolSpec     │───▶│ ToolCall     │───▶│ ToolResult   │
//! │ (per session)│    │ (invocation) │    │ (output)     │
//! └──────┬───────┘    └──────────────┘    └──────────────┘
//!        │
//!        ├─ aliases: "perplexity_search" → "web_search"
//!        └─ tools:   "save_story" → ToolDefinition
//! ```
//!
//! Models sometimes call a tool by an older or approximate name; the alias
//! table in [`ToolSpec`] resolves those without another round trip.
//!
//! - **Domain** (this module): definitions and validation, no I/O
//! - **Application** (`ToolSchemaPort`, `ToolSurface`): schema conversion and dispatch

pub mod entities;
pub mod traits;
pub mod value_objects;

pub use entities::{ToolCall, ToolDefinition, ToolParameter, ToolSpec};
pub use traits::{DefaultToolValidator, ToolValidator};
pub use value_objects::{ToolError, ToolResult, ToolResultMetadata};
