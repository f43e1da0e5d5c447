//! The evaluation report and its mutation surface.

use super::consistency::{self, ConsistencyIssue};
use super::metric::{Metric, Proportion};
use crate::core::error::DomainError;
use crate::story::Document;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which metric a value or issue belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Accuracy,
    Citations,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Accuracy => "accuracy",
            MetricKind::Citations => "citations",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Wire form of a report: `{"accuracy_report": {...}, "citations_report": {...}}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportRecord {
    pub accuracy_report: Metric,
    pub citations_report: Metric,
}

impl ReportRecord {
    pub fn metric(&self, kind: MetricKind) -> &Metric {
        match kind {
            MetricKind::Accuracy => &self.accuracy_report,
            MetricKind::Citations => &self.citations_report,
        }
    }

    pub fn consistency_issues(&self) -> Vec<ConsistencyIssue> {
        [MetricKind::Accuracy, MetricKind::Citations]
            .into_iter()
            .filter_map(|kind| consistency::check_metric(kind, self.metric(kind)))
            .collect()
    }
}

/// Read-only snapshot handed back to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportStatus {
    pub accuracy_proportion: Option<Proportion>,
    pub citations_proportion: Option<Proportion>,
    pub report: ReportRecord,
}

/// Partial update; every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricUpdate {
    pub accuracy_value: Option<f64>,
    pub citations_value: Option<f64>,
    pub accuracy_text: Option<String>,
    pub citations_text: Option<String>,
}

impl MetricUpdate {
    pub fn is_empty(&self) -> bool {
        self.accuracy_value.is_none()
            && self.citations_value.is_none()
            && self.accuracy_text.is_none()
            && self.citations_text.is_none()
    }
}

/// What an [`EvaluationReport::update`] call actually changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOutcome {
    /// Descriptions of the applied fields, in argument order.
    pub applied: Vec<String>,
    /// One message per rejected field.
    pub rejected: Vec<String>,
}

impl UpdateOutcome {
    pub fn any_applied(&self) -> bool {
        !self.applied.is_empty()
    }

    /// Text reported back to the model.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if self.applied.is_empty() && self.rejected.is_empty() {
            return "No updates provided".to_string();
        }
        if !self.applied.is_empty() {
            parts.push(format!(
                "Updated evaluation report: {}",
                self.applied.join(", ")
            ));
        }
        if !self.rejected.is_empty() {
            parts.push(format!("Rejected: {}", self.rejected.join("; ")));
        }
        parts.join(". ")
    }
}

/// A quality assessment bound to one finalized [`Document`].
///
/// The document is shared, never copied or mutated. Once the report is
/// marked saved it refuses further updates.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    document: Arc<Document>,
    accuracy: Metric,
    citations: Metric,
    updated: bool,
    saved: bool,
}

impl EvaluationReport {
    pub fn new(document: Arc<Document>) -> Self {
        Self {
            document,
            accuracy: Metric::default(),
            citations: Metric::default(),
            updated: false,
            saved: false,
        }
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn accuracy(&self) -> &Metric {
        &self.accuracy
    }

    pub fn citations(&self) -> &Metric {
        &self.citations
    }

    /// Whether any field has been applied by [`update`](Self::update).
    pub fn is_updated(&self) -> bool {
        self.updated
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    pub fn mark_saved(&mut self) {
        self.saved = true;
    }

    /// Apply each provided field independently.
    ///
    /// A value outside `[0, 1]` is rejected for its own field only; the other
    /// fields of the same call are still applied. Fails as a whole only when
    /// the report has already been saved.
    pub fn update(&mut self, update: MetricUpdate) -> Result<UpdateOutcome, DomainError> {
        if self.saved {
            return Err(DomainError::validation(
                "Evaluation report has already been saved and can no longer be updated",
            ));
        }

        let mut outcome = UpdateOutcome::default();

        for (kind, value) in [
            (MetricKind::Accuracy, update.accuracy_value),
            (MetricKind::Citations, update.citations_value),
        ] {
            let Some(value) = value else { continue };
            match Proportion::new(value) {
                Ok(p) => {
                    self.metric_mut(kind).value = Some(p);
                    outcome.applied.push(format!("{} proportion to {}", kind, p));
                }
                Err(_) => outcome.rejected.push(format!(
                    "{} proportion must be between 0 and 1 (got {})",
                    capitalize(kind.as_str()),
                    value
                )),
            }
        }

        for (kind, text) in [
            (MetricKind::Accuracy, update.accuracy_text),
            (MetricKind::Citations, update.citations_text),
        ] {
            let Some(text) = text else { continue };
            self.metric_mut(kind).explanation = text;
            outcome.applied.push(format!("{} report details", kind));
        }

        if outcome.any_applied() {
            self.updated = true;
        }
        Ok(outcome)
    }

    pub fn record(&self) -> ReportRecord {
        ReportRecord {
            accuracy_report: self.accuracy.clone(),
            citations_report: self.citations.clone(),
        }
    }

    pub fn status(&self) -> ReportStatus {
        ReportStatus {
            accuracy_proportion: self.accuracy.value,
            citations_proportion: self.citations.value,
            report: self.record(),
        }
    }

    pub fn consistency_issues(&self) -> Vec<ConsistencyIssue> {
        self.record().consistency_issues()
    }

    fn metric_mut(&mut self, kind: MetricKind) -> &mut Metric {
        match kind {
            MetricKind::Accuracy => &mut self.accuracy,
            MetricKind::Citations => &mut self.citations,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
