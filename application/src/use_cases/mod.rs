//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod authoring;
pub mod error;
pub mod evaluation;
pub mod simulation;
pub(crate) mod tool_helpers;
pub mod tool_loop;

#[cfg(test)]
pub(crate) mod testing;
