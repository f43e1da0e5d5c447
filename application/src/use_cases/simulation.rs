//! Simulation harness: repeated author → evaluate cycles.
//!
//! Cycles run one after another. Each gets its own story location, its own
//! document and its own report, so a failure in one cycle never reaches
//! another. Failed cycles are recorded as data; only misuse of the harness
//! itself is an error.

use super::authoring::{AuthorStoryInput, AuthorStoryUseCase};
use super::evaluation::{EvaluateStoryInput, EvaluateStoryUseCase};
use crate::config::{ExecutionParams, SessionModels};
use crate::ports::progress::SessionProgressNotifier;
use crate::ports::story_store::StoryStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storytime_domain::{ConsistencyIssue, ReportRecord, StoryLocation};
use thiserror::Error;
use tracing::{info, warn};

/// What to do when a cycle fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and run the remaining cycles.
    #[default]
    Continue,
    /// Stop after the first failed cycle.
    Abort,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "continue" => Ok(FailurePolicy::Continue),
            "abort" => Ok(FailurePolicy::Abort),
            other => Err(format!(
                "Unknown failure policy '{}' (expected 'continue' or 'abort')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub cycles: usize,
    /// Keep the story files instead of deleting them after each cycle.
    pub keep_stories: bool,
    pub failure_policy: FailurePolicy,
    pub models: SessionModels,
    pub execution: ExecutionParams,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            cycles: 10,
            keep_stories: false,
            failure_policy: FailurePolicy::default(),
            models: SessionModels::default(),
            execution: ExecutionParams::default(),
        }
    }
}

impl SimulationConfig {
    pub fn with_cycles(mut self, cycles: usize) -> Self {
        self.cycles = cycles;
        self
    }

    pub fn with_keep_stories(mut self, keep: bool) -> Self {
        self.keep_stories = keep;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_models(mut self, models: SessionModels) -> Self {
        self.models = models;
        self
    }

    pub fn with_execution(mut self, execution: ExecutionParams) -> Self {
        self.execution = execution;
        self
    }
}

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Simulation needs at least one cycle")]
    NoCycles,
}

/// Stage a cycle failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStage {
    Authoring,
    Evaluation,
}

impl std::fmt::Display for CycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CycleStage::Authoring => write!(f, "authoring"),
            CycleStage::Evaluation => write!(f, "evaluation"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    Evaluated {
        report: ReportRecord,
        consistency_issues: Vec<ConsistencyIssue>,
    },
    Failed {
        stage: CycleStage,
        error: String,
    },
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Evaluated { .. })
    }

    /// One-line description for progress output.
    pub fn summary(&self) -> String {
        match self {
            CycleOutcome::Evaluated { report, .. } => {
                let fmt = |m: &storytime_domain::Metric| {
                    m.value
                        .map(|p| format!("{:.2}", p.value()))
                        .unwrap_or_else(|| "-".to_string())
                };
                format!(
                    "accuracy {}, citations {}",
                    fmt(&report.accuracy_report),
                    fmt(&report.citations_report)
                )
            }
            CycleOutcome::Failed { stage, error } => format!("{} failed: {}", stage, error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub index: usize,
    pub location: StoryLocation,
    /// Story title, empty when authoring never set one.
    pub title: String,
    #[serde(flatten)]
    pub outcome: CycleOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationReport {
    pub cycles: Vec<CycleReport>,
    /// Set when the abort policy stopped the run early.
    pub aborted: bool,
}

impl SimulationReport {
    pub fn succeeded(&self) -> usize {
        self.cycles.iter().filter(|c| c.outcome.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.cycles.len() - self.succeeded()
    }

    /// Report records of the evaluated cycles, in cycle order.
    pub fn records(&self) -> Vec<&ReportRecord> {
        self.cycles
            .iter()
            .filter_map(|c| match &c.outcome {
                CycleOutcome::Evaluated { report, .. } => Some(report),
                CycleOutcome::Failed { .. } => None,
            })
            .collect()
    }
}

pub struct SimulationHarness {
    author: AuthorStoryUseCase,
    evaluate: EvaluateStoryUseCase,
    store: Arc<dyn StoryStore>,
}

impl SimulationHarness {
    pub fn new(
        author: AuthorStoryUseCase,
        evaluate: EvaluateStoryUseCase,
        store: Arc<dyn StoryStore>,
    ) -> Self {
        Self {
            author,
            evaluate,
            store,
        }
    }

    pub async fn run(
        &self,
        config: &SimulationConfig,
        progress: &dyn SessionProgressNotifier,
    ) -> Result<SimulationReport, SimulationError> {
        if config.cycles == 0 {
            return Err(SimulationError::NoCycles);
        }

        info!(
            "Starting simulation: {} cycles, policy {:?}",
            config.cycles, config.failure_policy
        );
        let mut report = SimulationReport::default();

        for index in 0..config.cycles {
            progress.on_cycle_start(index, config.cycles);
            let location = StoryLocation::simulation(index, chrono::Utc::now().timestamp());

            let cycle = self.run_cycle(index, location, config, progress).await;
            let success = cycle.outcome.is_success();
            progress.on_cycle_end(index, success, &cycle.outcome.summary());
            if success {
                info!("Cycle {} ({}/{}) evaluated", index, index + 1, config.cycles);
            } else {
                warn!(
                    "Cycle {} ({}/{}): {}",
                    index,
                    index + 1,
                    config.cycles,
                    cycle.outcome.summary()
                );
            }
            report.cycles.push(cycle);

            if !success && config.failure_policy == FailurePolicy::Abort {
                warn!("Aborting simulation after failed cycle {}", index);
                report.aborted = index + 1 < config.cycles;
                break;
            }
        }

        info!(
            "Simulation finished: {} evaluated, {} failed",
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    async fn run_cycle(
        &self,
        index: usize,
        location: StoryLocation,
        config: &SimulationConfig,
        progress: &dyn SessionProgressNotifier,
    ) -> CycleReport {
        let failed = |stage, error: String, title: String| CycleReport {
            index,
            location: location.clone(),
            title,
            outcome: CycleOutcome::Failed { stage, error },
        };

        let authored = self
            .author
            .execute(
                AuthorStoryInput::random_topic(
                    location.clone(),
                    config.models.author.clone(),
                    config.execution.clone(),
                ),
                progress,
            )
            .await;
        let authored = match authored {
            Ok(outcome) => outcome,
            Err(e) => return failed(CycleStage::Authoring, e.to_string(), String::new()),
        };
        let title = match authored.require_title() {
            Ok(title) => title.to_string(),
            Err(e) => {
                self.cleanup(&location, &authored.saved_versions, config);
                return failed(CycleStage::Authoring, e.to_string(), String::new());
            }
        };

        if authored.unsaved_changes {
            warn!(
                "Story {} was edited after its last save; evaluating the saved version",
                location
            );
        }
        let document = Arc::new(authored.stored_document().clone());
        let evaluated = self
            .evaluate
            .execute(
                EvaluateStoryInput::new(
                    document,
                    config.models.evaluator.clone(),
                    config.execution.clone(),
                ),
                progress,
            )
            .await;
        self.cleanup(&location, &authored.saved_versions, config);

        match evaluated {
            Ok(outcome) => CycleReport {
                index,
                location: location.clone(),
                title,
                outcome: CycleOutcome::Evaluated {
                    report: outcome.record,
                    consistency_issues: outcome.consistency_issues,
                },
            },
            Err(e) => failed(CycleStage::Evaluation, e.to_string(), title),
        }
    }

    /// Cleanup failures are logged and never fail the cycle.
    fn cleanup(&self, location: &StoryLocation, versions: &[String], config: &SimulationConfig) {
        if config.keep_stories {
            return;
        }
        match self.store.delete(location) {
            Ok(status) => info!("Cleanup {}: {}", location, status),
            Err(e) => warn!("Failed to delete story {}: {}", location, e),
        }
        match self.store.purge_versions(location, versions) {
            Ok(count) => info!("Cleanup {}: removed {} of {} versions", location, count, versions.len()),
            Err(e) => warn!("Failed to purge versions of {}: {}", location, e),
        }
    }
}
