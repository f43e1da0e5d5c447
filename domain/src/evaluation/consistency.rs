//! Cross-checks between a metric's value and the tally its explanation states.
//!
//! Evaluators are asked to record each score's arithmetic as a line of the
//! form `CALCULATION: <matched>/<total>`. The value must agree with that
//! line to within [`TOLERANCE`].

use super::metric::{Metric, Proportion, Tally};
use super::report::MetricKind;
use serde::Serialize;

pub const TOLERANCE: f64 = 0.005;

const MARKER: &str = "CALCULATION:";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ConsistencyIssue {
    /// Stored value disagrees with the stated tally.
    Mismatch {
        metric: MetricKind,
        stored: Proportion,
        tally: Tally,
        expected: Proportion,
    },
    /// Value set, but no calculation line in the explanation.
    MissingCalculation { metric: MetricKind, stored: Proportion },
    /// Calculation stated, but no value set.
    MissingValue { metric: MetricKind, tally: Tally },
    /// A calculation line that does not describe a valid tally.
    Unparsable { metric: MetricKind, line: String },
}

impl std::fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsistencyIssue::Mismatch {
                metric,
                stored,
                tally,
                expected,
            } => write!(
                f,
                "{} value {} does not match calculation {} (= {:.3})",
                metric,
                stored,
                tally,
                expected.value()
            ),
            ConsistencyIssue::MissingCalculation { metric, stored } => write!(
                f,
                "{} value {} has no CALCULATION line in its report",
                metric, stored
            ),
            ConsistencyIssue::MissingValue { metric, tally } => {
                write!(f, "{} report states {} but no value is set", metric, tally)
            }
            ConsistencyIssue::Unparsable { metric, line } => {
                write!(f, "{} report has an invalid calculation: {}", metric, line)
            }
        }
    }
}

/// Find the first calculation line in `text`.
///
/// Returns `None` when there is no such line, `Some(Err(line))` when the line
/// is present but malformed.
pub fn parse_calculation(text: &str) -> Option<Result<Tally, String>> {
    let line = text
        .lines()
        .find(|l| l.to_ascii_uppercase().contains(MARKER))?;
    let start = line.to_ascii_uppercase().find(MARKER)? + MARKER.len();
    let rest = line[start..].trim();

    let parsed = rest.split_once('/').and_then(|(m, t)| {
        let matched = m.trim().parse::<u64>().ok()?;
        let total: String = t
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        Some(Tally::new(matched, total.parse::<u64>().ok()?))
    });
    Some(parsed.ok_or_else(|| line.trim().to_string()))
}

pub fn check_metric(kind: MetricKind, metric: &Metric) -> Option<ConsistencyIssue> {
    match (metric.value, parse_calculation(&metric.explanation)) {
        (None, None) => None,
        (Some(stored), None) => Some(ConsistencyIssue::MissingCalculation {
            metric: kind,
            stored,
        }),
        (_, Some(Err(line))) => Some(ConsistencyIssue::Unparsable { metric: kind, line }),
        (None, Some(Ok(tally))) => Some(ConsistencyIssue::MissingValue {
            metric: kind,
            tally,
        }),
        (Some(stored), Some(Ok(tally))) => match tally.proportion() {
            Ok(expected) if stored.approx_eq(expected, TOLERANCE) => None,
            Ok(expected) => Some(ConsistencyIssue::Mismatch {
                metric: kind,
                stored,
                tally,
                expected,
            }),
            Err(_) => Some(ConsistencyIssue::Unparsable {
                metric: kind,
                line: format!("{} {}", MARKER, tally),
            }),
        },
    }
}
