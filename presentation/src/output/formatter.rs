//! Output formatter trait

use crate::cli::commands::OutputFormat;
use crate::output::{console::ConsoleFormatter, json::JsonFormatter};
use storytime_application::{SimulationReport, StorySummary};
use storytime_domain::{DocumentRecord, ReportRecord};

/// Trait for formatting command results
pub trait OutputFormatter {
    fn format_story(&self, story: &DocumentRecord) -> String;

    fn format_report(&self, report: &ReportRecord) -> String;

    fn format_simulation(&self, report: &SimulationReport) -> String;

    fn format_stories(&self, stories: &[StorySummary]) -> String;
}

/// Formatter for the selected output format.
pub fn formatter_for(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(ConsoleFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}
