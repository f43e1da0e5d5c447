//! Progress reporting for sessions and simulation runs.

pub mod reporter;
