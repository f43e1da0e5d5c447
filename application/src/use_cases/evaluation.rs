//! Evaluation session and the Evaluate Story use case.
//!
//! The session reviews a frozen [`Document`] and records its findings in an
//! [`EvaluationReport`]. The protocol is update first, save last: saving
//! before any update is refused, and once saved the report no longer
//! accepts updates. Saving again under another name is allowed.

use super::error::SessionError;
use super::tool_loop::{ToolLoop, ToolSurface};
use crate::config::ExecutionParams;
use crate::ports::content_provider::SearchProvider;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::{SessionKind, SessionProgressNotifier};
use crate::ports::report_store::ReportStore;
use crate::ports::tool_schema::ToolSchemaPort;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use storytime_domain::providers::format_hits;
use storytime_domain::story::location::validate_component;
use storytime_domain::{
    ConsistencyIssue, ConversationContext, Document, EvaluationPromptTemplate, EvaluationReport,
    MetricUpdate, Model, ReportRecord, Tally, ToolCall, ToolDefinition, ToolError, ToolParameter,
    ToolResult, ToolSpec,
};
use tracing::{info, warn};

/// The operations an evaluation model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationTool {
    WebSearch,
    GetStatus,
    UpdateReport,
    CalculateMetrics,
    SaveReport,
}

impl EvaluationTool {
    pub const ALL: [EvaluationTool; 5] = [
        EvaluationTool::WebSearch,
        EvaluationTool::GetStatus,
        EvaluationTool::UpdateReport,
        EvaluationTool::CalculateMetrics,
        EvaluationTool::SaveReport,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EvaluationTool::WebSearch => "web_search",
            EvaluationTool::GetStatus => "get_current_evaluation_status",
            EvaluationTool::UpdateReport => "update_evaluation_report",
            EvaluationTool::CalculateMetrics => "calculate_evaluation_metrics",
            EvaluationTool::SaveReport => "save_evaluation_report",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn definition(&self) -> ToolDefinition {
        let proportion = |name: &str, what: &str| {
            ToolParameter::new(name, format!("{} as a number between 0 and 1", what), false)
                .with_type("number")
        };
        match self {
            EvaluationTool::WebSearch => ToolDefinition::new(
                self.name(),
                "Search the web to check a claim or a citation",
            )
            .with_parameter(ToolParameter::new("query", "Search query", true)),
            EvaluationTool::GetStatus => ToolDefinition::new(
                self.name(),
                "Show the current proportions and report text as JSON",
            ),
            EvaluationTool::UpdateReport => ToolDefinition::new(
                self.name(),
                "Set any of the report fields. Out-of-range proportions are rejected individually.",
            )
            .with_parameter(proportion(
                "accuracy_proportion",
                "Accurate claims / claims checked",
            ))
            .with_parameter(proportion(
                "citations_proportion",
                "Valid citations / citations checked",
            ))
            .with_parameter(ToolParameter::new(
                "accuracy_report",
                "Claim-by-claim findings ending with a CALCULATION: <accurate>/<checked> line",
                false,
            ))
            .with_parameter(ToolParameter::new(
                "citations_report",
                "Citation-by-citation findings ending with a CALCULATION: <valid>/<checked> line",
                false,
            )),
            EvaluationTool::CalculateMetrics => ToolDefinition::new(
                self.name(),
                "Compute num_correct / total",
            )
            .with_parameter(
                ToolParameter::new("total", "Number of items checked", true).with_type("integer"),
            )
            .with_parameter(
                ToolParameter::new("num_correct", "Number of items that passed", true)
                    .with_type("integer"),
            ),
            EvaluationTool::SaveReport => ToolDefinition::new(
                self.name(),
                "Save the report. Requires at least one prior update; the report is read-only afterwards.",
            )
            .with_parameter(ToolParameter::new(
                "report_name",
                "File name without extension (defaults to the name you were given)",
                false,
            )),
        }
    }
}

/// Tool spec for evaluation sessions.
pub fn evaluation_tool_spec() -> ToolSpec {
    EvaluationTool::ALL
        .into_iter()
        .fold(ToolSpec::new(), |spec, tool| spec.register(tool.definition()))
        .register_alias("perplexity_search", EvaluationTool::WebSearch.name())
}

/// One review of one document.
pub struct EvaluationSession {
    report: EvaluationReport,
    report_name: String,
    spec: ToolSpec,
    store: Arc<dyn ReportStore>,
    search: Arc<dyn SearchProvider>,
    search_max_results: usize,
    saved_path: Option<PathBuf>,
}

impl EvaluationSession {
    pub fn new(
        document: Arc<Document>,
        report_name: impl Into<String>,
        store: Arc<dyn ReportStore>,
        search: Arc<dyn SearchProvider>,
    ) -> Self {
        Self {
            report: EvaluationReport::new(document),
            report_name: report_name.into(),
            spec: evaluation_tool_spec(),
            store,
            search,
            search_max_results: ExecutionParams::default().search_max_results,
            saved_path: None,
        }
    }

    pub fn with_search_max_results(mut self, max: usize) -> Self {
        self.search_max_results = max;
        self
    }

    pub fn report(&self) -> &EvaluationReport {
        &self.report
    }

    pub fn saved_path(&self) -> Option<&PathBuf> {
        self.saved_path.as_ref()
    }

    pub async fn web_search(&self, query: &str) -> Result<(String, usize), ToolError> {
        let hits = self
            .search
            .search(query, self.search_max_results)
            .await
            .map_err(|e| ToolError::execution_failed(format!("Error searching the web: {}", e)))?;
        Ok((
            format!(
                "Search completed. Found {} results.\n\n{}",
                hits.len(),
                format_hits(&hits)
            ),
            hits.len(),
        ))
    }

    pub fn status_json(&self) -> Result<String, ToolError> {
        serde_json::to_string_pretty(&self.report.status())
            .map_err(|e| ToolError::execution_failed(e.to_string()))
    }

    pub fn update(&mut self, update: MetricUpdate) -> Result<String, ToolError> {
        let outcome = self
            .report
            .update(update)
            .map_err(|e| ToolError::invalid_argument(e.to_string()))?;
        Ok(outcome.summary())
    }

    pub fn calculate(total: i64, num_correct: i64) -> Result<String, ToolError> {
        let proportion = Tally::from_counts(num_correct, total)
            .and_then(|t| t.proportion())
            .map_err(|e| ToolError::invalid_argument(e.to_string()))?;
        Ok(format!("Proportion: {}", proportion.value()))
    }

    pub fn save(&mut self, name: Option<&str>) -> Result<PathBuf, ToolError> {
        if !self.report.is_updated() {
            return Err(ToolError::invalid_argument(
                "Evaluation report has not been updated yet. Call update_evaluation_report before saving.",
            ));
        }
        let name = name.unwrap_or(&self.report_name).to_string();
        validate_component(&name, "Report name")
            .map_err(|e| ToolError::invalid_argument(e.to_string()))?;

        let path = self
            .store
            .save(&name, &self.report.record())
            .map_err(|e| {
                ToolError::execution_failed(format!("Error saving evaluation report: {}", e))
            })?;
        self.report.mark_saved();
        self.saved_path = Some(path.clone());
        info!("Evaluation report saved to {}", path.display());
        Ok(path)
    }

    async fn run_tool(&mut self, tool: EvaluationTool, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let name = tool.name();
        let result = match tool {
            EvaluationTool::WebSearch => {
                let query = call.require_string("query").map_err(ToolError::invalid_argument)?;
                let (output, count) = self.web_search(query).await?;
                ToolResult::success(name, output).with_match_count(count)
            }
            EvaluationTool::GetStatus => ToolResult::success(name, self.status_json()?),
            EvaluationTool::UpdateReport => {
                let update = MetricUpdate {
                    accuracy_value: call.get_f64("accuracy_proportion"),
                    citations_value: call.get_f64("citations_proportion"),
                    accuracy_text: call.get_string("accuracy_report").map(str::to_string),
                    citations_text: call.get_string("citations_report").map(str::to_string),
                };
                ToolResult::success(name, self.update(update)?)
            }
            EvaluationTool::CalculateMetrics => {
                let total = call.require_i64("total").map_err(ToolError::invalid_argument)?;
                let correct = call
                    .require_i64("num_correct")
                    .map_err(ToolError::invalid_argument)?;
                ToolResult::success(name, Self::calculate(total, correct)?)
            }
            EvaluationTool::SaveReport => {
                let requested = call.get_string("report_name").map(str::to_string);
                let path = self.save(requested.as_deref())?;
                let saved_name = requested.unwrap_or_else(|| self.report_name.clone());
                ToolResult::success(
                    name,
                    format!(
                        "Evaluation report saved successfully as '{}.json'",
                        saved_name
                    ),
                )
                .with_path(path.display().to_string())
            }
        };
        Ok(result)
    }
}

#[async_trait]
impl ToolSurface for EvaluationSession {
    fn kind(&self) -> SessionKind {
        SessionKind::Evaluation
    }

    fn tool_spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn dispatch(
        &mut self,
        call: &ToolCall,
        _progress: &dyn SessionProgressNotifier,
    ) -> ToolResult {
        let Some(tool) = EvaluationTool::from_name(&call.tool_name) else {
            return ToolResult::failure(
                &call.tool_name,
                ToolError::not_found(format!("tool '{}'", call.tool_name)),
            );
        };
        match self.run_tool(tool, call).await {
            Ok(result) => result,
            Err(error) => ToolResult::failure(tool.name(), error),
        }
    }
}

/// Result of one evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    /// Snapshot of the report when the loop ended, saved or not.
    pub record: ReportRecord,
    pub saved_path: Option<PathBuf>,
    pub consistency_issues: Vec<ConsistencyIssue>,
    pub turns: usize,
    pub conversation_id: String,
    pub final_text: String,
    pub exhausted: bool,
}

impl EvaluationOutcome {
    pub fn is_saved(&self) -> bool {
        self.saved_path.is_some()
    }
}

/// Input for [`EvaluateStoryUseCase`].
#[derive(Debug, Clone)]
pub struct EvaluateStoryInput {
    pub document: Arc<Document>,
    /// Default report file name, without extension.
    pub report_name: String,
    pub model: Model,
    pub execution: ExecutionParams,
}

impl EvaluateStoryInput {
    /// Report named `<location>-evaluation`.
    pub fn new(document: Arc<Document>, model: Model, execution: ExecutionParams) -> Self {
        let report_name = format!("{}-evaluation", document.location());
        Self {
            document,
            report_name,
            model,
            execution,
        }
    }

    pub fn with_report_name(mut self, name: impl Into<String>) -> Self {
        self.report_name = name.into();
        self
    }
}

/// Use case for fact-checking one story.
pub struct EvaluateStoryUseCase {
    gateway: Arc<dyn LlmGateway>,
    tool_schema: Arc<dyn ToolSchemaPort>,
    store: Arc<dyn ReportStore>,
    search: Arc<dyn SearchProvider>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl Clone for EvaluateStoryUseCase {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            tool_schema: self.tool_schema.clone(),
            store: self.store.clone(),
            search: self.search.clone(),
            conversation_logger: self.conversation_logger.clone(),
        }
    }
}

impl EvaluateStoryUseCase {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        tool_schema: Arc<dyn ToolSchemaPort>,
        store: Arc<dyn ReportStore>,
        search: Arc<dyn SearchProvider>,
    ) -> Self {
        Self {
            gateway,
            tool_schema,
            store,
            search,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub async fn execute(
        &self,
        input: EvaluateStoryInput,
        progress: &dyn SessionProgressNotifier,
    ) -> Result<EvaluationOutcome, SessionError> {
        let mut ctx = ConversationContext::new();
        info!(
            "Starting evaluation session {} for '{}' with {}",
            ctx.conversation_id(),
            input.document.location(),
            input.model
        );
        progress.on_session_start(SessionKind::Evaluation, &input.report_name);

        let prompt = EvaluationPromptTemplate::review(&input.document.serialize(), &input.report_name);
        self.conversation_logger.log(ConversationEvent::new(
            "session_start",
            ctx.conversation_id(),
            serde_json::json!({
                "kind": SessionKind::Evaluation.as_str(),
                "model": input.model.to_string(),
                "location": input.document.location().as_str(),
                "report_name": input.report_name,
            }),
        ));

        let session = self
            .gateway
            .create_session_with_system_prompt(&input.model, EvaluationPromptTemplate::system())
            .await?;

        let mut surface = EvaluationSession::new(
            input.document.clone(),
            input.report_name.clone(),
            self.store.clone(),
            self.search.clone(),
        )
        .with_search_max_results(input.execution.search_max_results);
        let tools = self.tool_schema.all_tools_schema(surface.tool_spec());

        let tool_loop = ToolLoop {
            session: session.as_ref(),
            tools: &tools,
            execution: &input.execution,
            progress,
            logger: self.conversation_logger.as_ref(),
        };
        let summary = tool_loop.run(&prompt, &mut surface, &mut ctx).await?;

        let consistency_issues = surface.report().consistency_issues();
        for issue in &consistency_issues {
            warn!("Evaluation report '{}': {}", input.report_name, issue);
        }

        let outcome = EvaluationOutcome {
            record: surface.report().record(),
            saved_path: surface.saved_path().cloned(),
            consistency_issues,
            turns: summary.turns,
            conversation_id: ctx.conversation_id().to_string(),
            final_text: summary.final_text,
            exhausted: summary.exhausted,
        };
        if !outcome.is_saved() {
            warn!(
                "Evaluation session {} ended without saving '{}'",
                outcome.conversation_id, input.report_name
            );
        }
        info!(
            "Evaluation session {} finished after {} tool turns",
            outcome.conversation_id, outcome.turns
        );
        progress.on_session_end(SessionKind::Evaluation, outcome.turns);
        self.conversation_logger.log(ConversationEvent::new(
            "session_end",
            ctx.conversation_id(),
            serde_json::json!({
                "kind": SessionKind::Evaluation.as_str(),
                "turns": outcome.turns,
                "exhausted": outcome.exhausted,
                "saved_path": outcome.saved_path.as_ref().map(|p| p.display().to_string()),
                "consistency_issues": outcome.consistency_issues,
                "elapsed_ms": ctx.elapsed_ms(),
            }),
        ));

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::progress::NoProgress;
    use crate::use_cases::testing::*;
    use serde_json::json;
    use storytime_domain::{MetricKind, Proportion, StoryLocation};

    fn document() -> Arc<Document> {
        let mut doc = Document::new(StoryLocation::new("press").unwrap());
        doc.set_title("The Press");
        doc.add_segment("Mainz", "In 1440 Gutenberg built a press.");
        doc.set_research("notes", false);
        Arc::new(doc)
    }

    fn session() -> (EvaluationSession, Arc<MemoryReportStore>) {
        let store = Arc::new(MemoryReportStore::default());
        let s = EvaluationSession::new(
            document(),
            "press-evaluation",
            store.clone(),
            Arc::new(MockSearch::default()),
        );
        (s, store)
    }

    fn use_case(gateway: ScriptedGateway) -> (EvaluateStoryUseCase, Arc<MemoryReportStore>) {
        let store = Arc::new(MemoryReportStore::default());
        let uc = EvaluateStoryUseCase::new(
            Arc::new(gateway),
            Arc::new(PassthroughSchema),
            store.clone(),
            Arc::new(MockSearch::default()),
        );
        (uc, store)
    }

    #[test]
    fn test_save_before_update_is_rejected() {
        let (mut s, store) = session();
        let err = s.save(None).unwrap_err();
        assert_eq!(err.code, "INVALID_ARGUMENT");
        assert!(err.message.contains("not been updated"));
        assert!(store.names().is_empty());
    }

    #[test]
    fn test_update_after_save_is_rejected_but_resave_allowed() {
        let (mut s, store) = session();
        s.update(MetricUpdate {
            accuracy_value: Some(0.5),
            ..Default::default()
        })
        .unwrap();
        s.save(None).unwrap();

        let err = s
            .update(MetricUpdate {
                accuracy_value: Some(0.9),
                ..Default::default()
            })
            .unwrap_err();
        assert!(err.message.contains("already been saved"));
        assert_eq!(
            s.report().accuracy().value,
            Some(Proportion::new(0.5).unwrap())
        );

        s.save(Some("copy")).unwrap();
        assert_eq!(store.names(), vec!["copy", "press-evaluation"]);
    }

    #[test]
    fn test_save_rejects_path_like_name() {
        let (mut s, _) = session();
        s.update(MetricUpdate {
            accuracy_value: Some(0.5),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(s.save(Some("../x")).unwrap_err().code, "INVALID_ARGUMENT");
        assert!(!s.report().is_saved());
    }

    #[test]
    fn test_calculate() {
        assert_eq!(EvaluationSession::calculate(5, 4).unwrap(), "Proportion: 0.8");
        assert_eq!(EvaluationSession::calculate(0, 0).unwrap_err().code, "INVALID_ARGUMENT");
        assert!(EvaluationSession::calculate(2, 3).is_err());
    }

    #[tokio::test]
    async fn test_web_search_does_not_touch_document() {
        let (s, _) = session();
        let (output, count) = s.web_search("gutenberg").await.unwrap();
        assert_eq!(count, 2);
        assert!(output.starts_with("Search completed. Found 2 results.\n\nTitle: Gutenberg"));
        assert_eq!(s.report().document().research_notes(), "notes");
    }

    #[tokio::test]
    async fn test_status_reports_current_values() {
        let (mut s, _) = session();
        s.dispatch(
            &ToolCall::new("update_evaluation_report")
                .with_arg("citations_proportion", 1.5)
                .with_arg("accuracy_proportion", "0.25"),
            &NoProgress,
        )
        .await;
        let status: serde_json::Value =
            serde_json::from_str(&s.status_json().unwrap()).unwrap();
        assert_eq!(status["accuracy_proportion"], json!(0.25));
        assert!(status["citations_proportion"].is_null());
    }

    #[tokio::test]
    async fn test_scripted_evaluation_saves_both_metrics() {
        let accuracy_text = "1. Gutenberg built a press in 1440: ACCURATE\nCALCULATION: 4/5";
        let citations_text = "1. https://example.org: VALID\nCALCULATION: 1/1";
        let gateway = ScriptedGateway::new(vec![vec![
            tool_response(vec![("c1", "perplexity_search", json!({"query": "gutenberg 1440"}))]),
            tool_response(vec![(
                "c2",
                "update_evaluation_report",
                json!({"accuracy_proportion": 0.8, "accuracy_report": accuracy_text}),
            )]),
            tool_response(vec![(
                "c3",
                "update_evaluation_report",
                json!({"citations_proportion": 1.0, "citations_report": citations_text}),
            )]),
            tool_response(vec![(
                "c4",
                "save_evaluation_report",
                json!({"report_name": "report1"}),
            )]),
            text_response("Evaluation complete."),
        ]]);
        let sent = gateway.sent_results();
        let (uc, store) = use_case(gateway);

        let outcome = uc
            .execute(
                EvaluateStoryInput::new(document(), Model::default(), ExecutionParams::default()),
                &NoProgress,
            )
            .await
            .unwrap();

        assert!(outcome.is_saved());
        assert!(outcome.consistency_issues.is_empty());
        assert_eq!(outcome.turns, 4);

        let saved = store.get("report1").unwrap();
        assert_eq!(saved, outcome.record);
        assert_eq!(
            saved.metric(MetricKind::Accuracy).value,
            Some(Proportion::new(0.8).unwrap())
        );
        assert_eq!(saved.accuracy_report.explanation, accuracy_text);
        assert_eq!(
            saved.metric(MetricKind::Citations).value,
            Some(Proportion::new(1.0).unwrap())
        );
        assert_eq!(saved.citations_report.explanation, citations_text);

        let sent = sent.lock().unwrap();
        assert!(sent.iter().all(|r| !r.is_error));
        assert_eq!(
            sent[3].output,
            "Evaluation report saved successfully as 'report1.json'"
        );
    }

    #[tokio::test]
    async fn test_inconsistent_report_is_flagged() {
        let gateway = ScriptedGateway::new(vec![vec![
            tool_response(vec![(
                "c1",
                "update_evaluation_report",
                json!({
                    "accuracy_proportion": 0.9,
                    "accuracy_report": "Checked five claims.\nCALCULATION: 3/5",
                }),
            )]),
            text_response("Done, not saving."),
        ]]);
        let (uc, store) = use_case(gateway);

        let outcome = uc
            .execute(
                EvaluateStoryInput::new(document(), Model::default(), ExecutionParams::default()),
                &NoProgress,
            )
            .await
            .unwrap();

        assert!(!outcome.is_saved());
        assert!(store.names().is_empty());
        assert_eq!(outcome.consistency_issues.len(), 1);
        assert!(matches!(
            outcome.consistency_issues[0],
            ConsistencyIssue::Mismatch {
                metric: MetricKind::Accuracy,
                ..
            }
        ));
    }

    #[test]
    fn test_default_report_name() {
        let input =
            EvaluateStoryInput::new(document(), Model::default(), ExecutionParams::default());
        assert_eq!(input.report_name, "press-evaluation");
        assert_eq!(input.with_report_name("r").report_name, "r");
    }
}
