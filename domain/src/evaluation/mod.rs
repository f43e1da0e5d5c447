//! Evaluation domain module
//!
//! An [`EvaluationReport`] scores one finalized story on two axes, each a
//! [`Metric`] holding an optional [`Proportion`] and a free-text explanation:
//!
//! - **accuracy** = accurate claims / claims checked
//! - **citations** = valid citations / citations checked
//!
//! The report holds its story through an `Arc`, so the binding is to one
//! immutable snapshot.

pub mod consistency;
pub mod metric;
pub mod report;

pub use consistency::ConsistencyIssue;
pub use metric::{Metric, Proportion, Tally};
pub use report::{
    EvaluationReport, MetricKind, MetricUpdate, ReportRecord, ReportStatus, UpdateOutcome,
};
