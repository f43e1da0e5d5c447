//! Console output formatter for stories, reports and simulation runs

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use storytime_application::{CycleOutcome, SimulationReport, StorySummary};
use storytime_domain::{DocumentRecord, Metric, ReportRecord, core::string::truncate};

/// Formats command results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Inline images are shown by size, not content.
    fn image_label(uri: &str) -> String {
        if uri.starts_with("data:") {
            format!("[inline image, {} bytes]", uri.len())
        } else {
            uri.to_string()
        }
    }

    fn metric_line(name: &str, metric: &Metric) -> String {
        let value = match metric.value {
            Some(p) => {
                let v = p.value();
                let text = format!("{:.2}", v);
                if v >= 0.8 {
                    text.green().bold().to_string()
                } else if v >= 0.5 {
                    text.yellow().bold().to_string()
                } else {
                    text.red().bold().to_string()
                }
            }
            None => "not set".dimmed().to_string(),
        };
        format!("{} {}", format!("{}:", name).cyan().bold(), value)
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_story(&self, story: &DocumentRecord) -> String {
        let mut output = String::new();

        let title = if story.title.is_empty() {
            "(untitled)"
        } else {
            story.title.as_str()
        };
        output.push_str(&Self::header(title));
        output.push('\n');

        for segment in &story.segments {
            output.push_str(&format!(
                "\n{}\n{}\n",
                format!("── {} ──", segment.title).yellow().bold(),
                segment.text
            ));
            for image in &segment.images {
                output.push_str(&format!("  {} {}\n", "image:".dimmed(), Self::image_label(image)));
            }
        }

        if !story.research_document.trim().is_empty() {
            output.push_str(&Self::section_header("Research Notes"));
            output.push_str(&Self::indent(&truncate(&story.research_document, 1200), "  "));
            output.push('\n');
        }

        output.push_str(&Self::footer());
        output
    }

    fn format_report(&self, report: &ReportRecord) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Evaluation Report"));
        output.push('\n');

        for (name, metric) in [
            ("Accuracy", &report.accuracy_report),
            ("Citations", &report.citations_report),
        ] {
            output.push_str(&format!("\n{}\n", Self::metric_line(name, metric)));
            if !metric.explanation.is_empty() {
                output.push_str(&Self::indent(&metric.explanation, "  "));
                output.push('\n');
            }
        }

        let issues = report.consistency_issues();
        if !issues.is_empty() {
            output.push_str(&format!("\n{}\n", "Consistency Issues:".yellow().bold()));
            for issue in &issues {
                output.push_str(&format!("  * {}\n", issue));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    fn format_simulation(&self, report: &SimulationReport) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Simulation Results"));
        output.push('\n');

        for cycle in &report.cycles {
            let marker = match &cycle.outcome {
                CycleOutcome::Evaluated { .. } => "✓".green(),
                CycleOutcome::Failed { .. } => "✗".red(),
            };
            let title = if cycle.title.is_empty() {
                "-".dimmed().to_string()
            } else {
                cycle.title.bold().to_string()
            };
            output.push_str(&format!(
                "\n{} {} {}  {}\n    {}\n",
                marker,
                format!("#{}", cycle.index).cyan(),
                cycle.location.as_str().dimmed(),
                title,
                cycle.outcome.summary()
            ));
        }

        output.push_str(&Self::section_header("Summary"));
        output.push_str(&format!(
            "{} evaluated, {} failed\n",
            report.succeeded().to_string().green().bold(),
            report.failed().to_string().red().bold()
        ));
        if report.aborted {
            output.push_str(&format!("{}\n", "Stopped early after a failed cycle.".yellow()));
        }

        output.push_str(&Self::footer());
        output
    }

    fn format_stories(&self, stories: &[StorySummary]) -> String {
        if stories.is_empty() {
            return format!("{}\n", "No stories saved yet.".dimmed());
        }

        let mut output = String::new();
        for story in stories {
            output.push_str(&format!(
                "{}  {}  {}\n",
                story.modified_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
                story.title.bold(),
                story.filename.cyan()
            ));
        }
        output
    }
}
