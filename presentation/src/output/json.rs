//! JSON output formatter

use crate::output::formatter::OutputFormatter;
use serde::Serialize;
use storytime_application::{SimulationReport, StorySummary};
use storytime_domain::{DocumentRecord, ReportRecord};

pub struct JsonFormatter;

fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

impl OutputFormatter for JsonFormatter {
    fn format_story(&self, story: &DocumentRecord) -> String {
        pretty(story)
    }

    fn format_report(&self, report: &ReportRecord) -> String {
        pretty(report)
    }

    /// Only the report records of evaluated cycles.
    fn format_simulation(&self, report: &SimulationReport) -> String {
        pretty(&report.records())
    }

    fn format_stories(&self, stories: &[StorySummary]) -> String {
        pretty(stories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storytime_domain::Segment;

    #[test]
    fn test_story_json_matches_persisted_shape() {
        let story = DocumentRecord {
            title: "The Press".into(),
            research_document: "notes".into(),
            segments: vec![Segment::new("Mainz", "It began here.")],
        };
        let value: serde_json::Value =
            serde_json::from_str(&JsonFormatter.format_story(&story)).unwrap();
        assert_eq!(value["title"], "The Press");
        assert_eq!(value["segments"][0]["title"], "Mainz");
    }

    #[test]
    fn test_empty_simulation_is_empty_array() {
        let out = JsonFormatter.format_simulation(&SimulationReport::default());
        assert_eq!(out.trim(), "[]");
    }
}
