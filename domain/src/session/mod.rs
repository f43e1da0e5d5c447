//! LLM session domain.
//!
//! - [`response::LlmResponse`]: structured model output (text and tool use)
//! - [`context::ConversationContext`]: conversation id and turn counter for one session

pub mod context;
pub mod response;
