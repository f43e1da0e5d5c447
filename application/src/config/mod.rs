//! Application-level configuration.
//!
//! - [`ExecutionParams`]: tool loop control (turn limit, search size, timeouts)
//! - [`SessionModels`]: model per session role

pub mod execution_params;
pub mod session_models;

pub use execution_params::ExecutionParams;
pub use session_models::SessionModels;
