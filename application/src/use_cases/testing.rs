//! Test doubles shared by the use case tests.

use crate::ports::content_provider::{ImageProvider, ProviderError, SearchProvider};
use crate::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession, ToolResultMessage};
use crate::ports::report_store::ReportStore;
use crate::ports::story_store::{DeleteStatus, StorageError, StorySummary, StoryStore};
use crate::ports::tool_schema::ToolSchemaPort;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use storytime_domain::{
    ContentBlock, Document, GeneratedImage, ImageSize, LlmResponse, Model, ReportRecord,
    SearchHit, StopReason, StoryLocation, ToolDefinition,
};

// ==================== LLM ====================

pub fn text_response(text: &str) -> LlmResponse {
    LlmResponse::from_text(text)
}

pub fn tool_response(calls: Vec<(&str, &str, Value)>) -> LlmResponse {
    let content = calls
        .into_iter()
        .map(|(id, name, input)| {
            let input: HashMap<String, Value> = match input {
                Value::Object(map) => map.into_iter().collect(),
                _ => HashMap::new(),
            };
            ContentBlock::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input,
            }
        })
        .collect();
    LlmResponse {
        content,
        stop_reason: Some(StopReason::ToolUse),
        model: None,
    }
}

pub enum Scripted {
    Response(LlmResponse),
    Error(String),
}

/// Session replaying a fixed list of responses; falls back to "Done." when exhausted.
pub struct ScriptedSession {
    model: Model,
    script: Mutex<VecDeque<Scripted>>,
    sent_results: Arc<Mutex<Vec<ToolResultMessage>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSession {
    fn next(&self) -> Result<LlmResponse, GatewayError> {
        match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Response(r)) => Ok(r),
            Some(Scripted::Error(e)) => Err(GatewayError::RequestFailed(e)),
            None => Ok(LlmResponse::from_text("Done.")),
        }
    }
}

#[async_trait]
impl LlmSession for ScriptedSession {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn send_with_tools(
        &self,
        content: &str,
        _tools: &[Value],
    ) -> Result<LlmResponse, GatewayError> {
        self.prompts.lock().unwrap().push(content.to_string());
        self.next()
    }

    async fn send_tool_results(
        &self,
        results: &[ToolResultMessage],
    ) -> Result<LlmResponse, GatewayError> {
        self.sent_results.lock().unwrap().extend_from_slice(results);
        self.next()
    }
}

/// Gateway handing out one scripted session per `create_session` call, in order.
pub struct ScriptedGateway {
    sessions: Mutex<VecDeque<Vec<Scripted>>>,
    sent_results: Arc<Mutex<Vec<ToolResultMessage>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    system_prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGateway {
    pub fn new(sessions: Vec<Vec<LlmResponse>>) -> Self {
        Self::with_scripts(
            sessions
                .into_iter()
                .map(|s| s.into_iter().map(Scripted::Response).collect())
                .collect(),
        )
    }

    pub fn with_scripts(sessions: Vec<Vec<Scripted>>) -> Self {
        Self {
            sessions: Mutex::new(sessions.into()),
            sent_results: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            system_prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every tool result sent back, across all sessions.
    pub fn sent_results(&self) -> Arc<Mutex<Vec<ToolResultMessage>>> {
        self.sent_results.clone()
    }

    /// Every opening user prompt, across all sessions.
    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        self.prompts.clone()
    }

    pub fn system_prompts(&self) -> Arc<Mutex<Vec<String>>> {
        self.system_prompts.clone()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn create_session_with_system_prompt(
        &self,
        model: &Model,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        self.system_prompts
            .lock()
            .unwrap()
            .push(system_prompt.to_string());
        let script = self
            .sessions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GatewayError::Other("no scripted session left".into()))?;
        Ok(Box::new(ScriptedSession {
            model: model.clone(),
            script: Mutex::new(script.into()),
            sent_results: self.sent_results.clone(),
            prompts: self.prompts.clone(),
        }))
    }
}

pub struct PassthroughSchema;

impl ToolSchemaPort for PassthroughSchema {
    fn tool_to_schema(&self, tool: &ToolDefinition) -> Value {
        json!({ "name": tool.name })
    }
}

// ==================== Providers ====================

#[derive(Default)]
pub struct MockSearch {
    queries: Mutex<Vec<String>>,
}

impl MockSearch {
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ProviderError> {
        self.queries.lock().unwrap().push(query.to_string());
        let hits = vec![
            SearchHit::new(
                "Gutenberg",
                "https://example.org/gutenberg",
                "Johannes Gutenberg introduced movable type in Europe.",
            ),
            SearchHit::new(
                "Printing",
                "https://example.org/printing",
                "By 1500 presses operated in over 200 cities.",
            ),
        ];
        Ok(hits.into_iter().take(max_results).collect())
    }
}

#[derive(Default)]
pub struct MockImages {
    calls: AtomicUsize,
    failure: Mutex<Option<String>>,
}

impl MockImages {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl ImageProvider for MockImages {
    async fn generate(&self, _prompt: &str, _size: ImageSize) -> Result<GeneratedImage, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(ProviderError::Request(message));
        }
        Ok(GeneratedImage::Inline {
            base64: "aW1hZ2U=".to_string(),
        })
    }
}

// ==================== Stores ====================

/// In-memory story store keyed by file name.
#[derive(Default)]
pub struct MemoryStoryStore {
    files: Mutex<BTreeMap<String, String>>,
    deletes: Mutex<Vec<String>>,
}

impl MemoryStoryStore {
    pub fn file_names(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn insert(&self, name: &str, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), content.to_string());
    }

    pub fn deletes(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

impl StoryStore for MemoryStoryStore {
    fn save_version(&self, document: &Document, label: &str) -> Result<PathBuf, StorageError> {
        let name = document.location().version_file_name(label)?;
        let json = serde_json::to_string_pretty(&document.serialize())?;
        self.files.lock().unwrap().insert(name.clone(), json);
        Ok(PathBuf::from("stories").join(name))
    }

    fn delete(&self, location: &StoryLocation) -> Result<DeleteStatus, StorageError> {
        let name = location.file_name();
        self.deletes.lock().unwrap().push(location.to_string());
        let path = PathBuf::from("stories").join(&name);
        Ok(match self.files.lock().unwrap().remove(&name) {
            Some(_) => DeleteStatus::Deleted(path),
            None => DeleteStatus::Absent(path),
        })
    }

    fn purge_versions(
        &self,
        location: &StoryLocation,
        labels: &[String],
    ) -> Result<usize, StorageError> {
        let mut files = self.files.lock().unwrap();
        let mut removed = 0;
        for label in labels {
            if files.remove(&location.version_file_name(label)?).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn list(&self) -> Result<Vec<StorySummary>, StorageError> {
        Ok(Vec::new())
    }

    fn load(&self, filename: &str) -> Result<Option<String>, StorageError> {
        Ok(self.files.lock().unwrap().get(filename).cloned())
    }
}

#[derive(Default)]
pub struct MemoryReportStore {
    reports: Mutex<BTreeMap<String, ReportRecord>>,
}

impl MemoryReportStore {
    pub fn get(&self, name: &str) -> Option<ReportRecord> {
        self.reports.lock().unwrap().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.reports.lock().unwrap().keys().cloned().collect()
    }
}

impl ReportStore for MemoryReportStore {
    fn save(&self, name: &str, report: &ReportRecord) -> Result<PathBuf, StorageError> {
        self.reports
            .lock()
            .unwrap()
            .insert(name.to_string(), report.clone());
        Ok(PathBuf::from("evaluation").join(format!("{}.json", name)))
    }
}
