//! Output formatting for stories, reports and simulation runs.

pub mod console;
pub mod formatter;
pub mod json;
