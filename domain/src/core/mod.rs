//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: LLM models used by the authoring and evaluation sessions
//! - [`error::DomainError`]: domain-level errors
//! - [`string`]: truncation helpers for previews

pub mod error;
pub mod model;
pub mod string;
