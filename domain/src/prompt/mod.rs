//! Prompt domain
//!
//! System and user prompts for the authoring and evaluation sessions.

pub mod authoring;
pub mod evaluation;

pub use authoring::AuthoringPromptTemplate;
pub use evaluation::EvaluationPromptTemplate;
