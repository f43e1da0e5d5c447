//! Authoring session and the Author Story use case.
//!
//! An [`AuthoringSession`] owns one fresh [`Document`] and exposes the
//! document mutation surface as tools. [`AuthorStoryUseCase`] drives a model
//! through the shared tool loop against that surface.
//!
//! ```text
//! Idle ─set_title─▶ Drafting ─▶ (Segmenting ⇄ Illustrating ⇄ Researching) ─save─▶ Saved
//!                      │
//!                      └─ loop ends with a title and no segments ─▶ Rejected
//! ```

use super::error::SessionError;
use super::tool_loop::{ToolLoop, ToolSurface};
use crate::config::ExecutionParams;
use crate::ports::content_provider::{ImageProvider, SearchProvider};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::progress::{SessionKind, SessionProgressNotifier};
use crate::ports::story_store::StoryStore;
use crate::ports::tool_schema::ToolSchemaPort;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use storytime_domain::providers::format_hits;
use storytime_domain::{
    AuthoringPromptTemplate, ConversationContext, Document, DomainError, ImageSize, Model,
    SectionWrite, StoryLocation, ToolCall, ToolDefinition, ToolError, ToolParameter, ToolResult,
    ToolSpec,
};
use tracing::{debug, info};

// ==================== State machine ====================

/// Where an authoring session is in building its story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthoringState {
    Idle,
    Drafting,
    Segmenting,
    Illustrating,
    Researching,
    Saved,
    Rejected,
}

impl AuthoringState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthoringState::Idle => "idle",
            AuthoringState::Drafting => "drafting",
            AuthoringState::Segmenting => "segmenting",
            AuthoringState::Illustrating => "illustrating",
            AuthoringState::Researching => "researching",
            AuthoringState::Saved => "saved",
            AuthoringState::Rejected => "rejected",
        }
    }

}

impl std::fmt::Display for AuthoringState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==================== Tools ====================

/// The operations an authoring model may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthoringTool {
    SetTitle,
    AddSegment,
    WriteSegmentText,
    AddSegmentImage,
    GenerateAndAddImage,
    AddResearch,
    AddCitation,
    WebSearch,
    GetStoryJson,
    GetStorySegments,
    SaveStory,
}

impl AuthoringTool {
    pub const ALL: [AuthoringTool; 11] = [
        AuthoringTool::SetTitle,
        AuthoringTool::AddSegment,
        AuthoringTool::WriteSegmentText,
        AuthoringTool::AddSegmentImage,
        AuthoringTool::GenerateAndAddImage,
        AuthoringTool::AddResearch,
        AuthoringTool::AddCitation,
        AuthoringTool::WebSearch,
        AuthoringTool::GetStoryJson,
        AuthoringTool::GetStorySegments,
        AuthoringTool::SaveStory,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AuthoringTool::SetTitle => "set_story_title",
            AuthoringTool::AddSegment => "add_story_segment",
            AuthoringTool::WriteSegmentText => "write_segment_text",
            AuthoringTool::AddSegmentImage => "add_segment_image",
            AuthoringTool::GenerateAndAddImage => "generate_and_add_image",
            AuthoringTool::AddResearch => "add_research_document",
            AuthoringTool::AddCitation => "add_citation",
            AuthoringTool::WebSearch => "web_search",
            AuthoringTool::GetStoryJson => "get_story_json",
            AuthoringTool::GetStorySegments => "get_story_segments",
            AuthoringTool::SaveStory => "save_story",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// State entered after a successful call; `None` for read-only tools.
    fn transition(&self) -> Option<AuthoringState> {
        match self {
            AuthoringTool::SetTitle => Some(AuthoringState::Drafting),
            AuthoringTool::AddSegment | AuthoringTool::WriteSegmentText => {
                Some(AuthoringState::Segmenting)
            }
            AuthoringTool::AddSegmentImage | AuthoringTool::GenerateAndAddImage => {
                Some(AuthoringState::Illustrating)
            }
            AuthoringTool::AddResearch | AuthoringTool::AddCitation | AuthoringTool::WebSearch => {
                Some(AuthoringState::Researching)
            }
            AuthoringTool::SaveStory => Some(AuthoringState::Saved),
            AuthoringTool::GetStoryJson | AuthoringTool::GetStorySegments => None,
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        let segment_title = || {
            ToolParameter::new("segment_title", "Title of an existing segment", true)
        };
        let replace = |what: &str| {
            ToolParameter::new(
                "replace",
                format!("Replace the existing {} instead of appending (default false)", what),
                false,
            )
            .with_type("boolean")
        };

        match self {
            AuthoringTool::SetTitle => ToolDefinition::new(
                self.name(),
                "Set the story title. To refuse a topic, set the title to the reason and add no segments.",
            )
            .with_parameter(ToolParameter::new("title", "The story title", true)),
            AuthoringTool::AddSegment => ToolDefinition::new(
                self.name(),
                "Append a new segment to the end of the story",
            )
            .with_parameter(ToolParameter::new("title", "Segment title, used to address it later", true))
            .with_parameter(ToolParameter::new("text", "Initial segment text", false)),
            AuthoringTool::WriteSegmentText => ToolDefinition::new(
                self.name(),
                "Append text to a segment, or replace its text",
            )
            .with_parameter(segment_title())
            .with_parameter(ToolParameter::new("text", "Text to write", true))
            .with_parameter(replace("text")),
            AuthoringTool::AddSegmentImage => ToolDefinition::new(
                self.name(),
                "Append an existing image URL to a segment, or replace its images",
            )
            .with_parameter(segment_title())
            .with_parameter(ToolParameter::new("image_url", "Image URL or data URI", true))
            .with_parameter(replace("images")),
            AuthoringTool::GenerateAndAddImage => ToolDefinition::new(
                self.name(),
                "Generate an illustration in the StoryTime style and append it to a segment",
            )
            .with_parameter(segment_title())
            .with_parameter(ToolParameter::new(
                "prompt",
                "Detailed description of the image, mentioning the StoryTime comic-book style",
                true,
            ))
            .with_parameter(
                ToolParameter::new("size", "Image size (default 1024x1024)", false)
                    .with_allowed(ImageSize::ALL.map(|s| s.as_str())),
            ),
            AuthoringTool::AddResearch => ToolDefinition::new(
                self.name(),
                "Add notes to the story's research document",
            )
            .with_parameter(ToolParameter::new("research_text", "Research notes", true))
            .with_parameter(replace("research document")),
            AuthoringTool::AddCitation => ToolDefinition::new(
                self.name(),
                "Record a source (URL or reference) the story relies on",
            )
            .with_parameter(ToolParameter::new("source", "Source URL or reference", true)),
            AuthoringTool::WebSearch => ToolDefinition::new(
                self.name(),
                "Search the web. Results are also appended to the research document.",
            )
            .with_parameter(ToolParameter::new("query", "Search query", true)),
            AuthoringTool::GetStoryJson => ToolDefinition::new(
                self.name(),
                "Show the whole story as JSON (image data omitted)",
            ),
            AuthoringTool::GetStorySegments => {
                ToolDefinition::new(self.name(), "List the segment titles in order")
            }
            AuthoringTool::SaveStory => ToolDefinition::new(
                self.name(),
                "Save a versioned snapshot of the story. Requires a title, at least one segment and research notes or citations.",
            )
            .with_parameter(ToolParameter::new(
                "version_name",
                "Version label, e.g. v1",
                true,
            )),
        }
    }
}

/// Tool spec for authoring sessions.
pub fn authoring_tool_spec() -> ToolSpec {
    AuthoringTool::ALL
        .into_iter()
        .fold(ToolSpec::new(), |spec, tool| spec.register(tool.definition()))
        .register_alias("perplexity_search", AuthoringTool::WebSearch.name())
        .register_alias("add_segment", AuthoringTool::AddSegment.name())
        .register_alias("set_title", AuthoringTool::SetTitle.name())
}

fn domain_to_tool_error(error: DomainError) -> ToolError {
    match error {
        DomainError::SegmentNotFound(_) => ToolError::new("NOT_FOUND", error.to_string()),
        DomainError::Validation(message) => ToolError::invalid_argument(message),
    }
}

// ==================== Session ====================

/// One authoring run over one document.
pub struct AuthoringSession {
    document: Document,
    state: AuthoringState,
    spec: ToolSpec,
    store: Arc<dyn StoryStore>,
    search: Arc<dyn SearchProvider>,
    images: Arc<dyn ImageProvider>,
    search_max_results: usize,
    saved_path: Option<PathBuf>,
    /// Document as of the last successful save.
    saved_document: Option<Document>,
    /// Labels saved during this session, in first-save order.
    saved_versions: Vec<String>,
}

impl AuthoringSession {
    pub fn new(
        location: StoryLocation,
        store: Arc<dyn StoryStore>,
        search: Arc<dyn SearchProvider>,
        images: Arc<dyn ImageProvider>,
    ) -> Self {
        Self {
            document: Document::new(location),
            state: AuthoringState::Idle,
            spec: authoring_tool_spec(),
            store,
            search,
            images,
            search_max_results: ExecutionParams::default().search_max_results,
            saved_path: None,
            saved_document: None,
            saved_versions: Vec::new(),
        }
    }

    pub fn with_search_max_results(mut self, max: usize) -> Self {
        self.search_max_results = max;
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn state(&self) -> AuthoringState {
        self.state
    }

    pub fn saved_path(&self) -> Option<&PathBuf> {
        self.saved_path.as_ref()
    }

    /// The document differs from its last saved snapshot. Citations are not
    /// part of the stored form and never count as a change.
    pub fn has_unsaved_changes(&self) -> bool {
        self.saved_document
            .as_ref()
            .is_some_and(|saved| saved.serialize() != self.document.serialize())
    }

    // ==================== Operations ====================

    pub fn set_title(&mut self, title: &str) -> String {
        self.document.set_title(title);
        format!("Story title set to: {}", title)
    }

    pub fn add_segment(&mut self, title: &str, text: &str) -> String {
        if self.document.add_segment(title, text) {
            format!(
                "Added segment '{}' to the story. Warning: a segment with this title already exists, so the new one cannot be addressed by title; use a distinct title.",
                title
            )
        } else {
            format!("Added segment '{}' to the story", title)
        }
    }

    pub fn write_segment_text(
        &mut self,
        segment_title: &str,
        text: &str,
        replace: bool,
    ) -> Result<String, ToolError> {
        self.write(segment_title, SectionWrite::text(text, replace))?;
        Ok(format!("Updated text in segment '{}'", segment_title))
    }

    pub fn add_segment_image(
        &mut self,
        segment_title: &str,
        image_url: &str,
        replace: bool,
    ) -> Result<String, ToolError> {
        self.write(
            segment_title,
            SectionWrite::images(vec![image_url.to_string()], replace),
        )?;
        if replace {
            Ok(format!("Replaced images in segment '{}'", segment_title))
        } else {
            Ok(format!("Added image to segment '{}'", segment_title))
        }
    }

    /// The segment is checked before the provider is called, so a bad title
    /// never costs a generation.
    pub async fn generate_and_add_image(
        &mut self,
        segment_title: &str,
        prompt: &str,
        size: ImageSize,
    ) -> Result<String, ToolError> {
        if !self.document.has_segment(segment_title) {
            return Err(self.segment_not_found(segment_title));
        }

        let image = self
            .images
            .generate(prompt, size)
            .await
            .map_err(|e| ToolError::execution_failed(format!("Error generating image: {}", e)))?;

        self.write(
            segment_title,
            SectionWrite::AppendImages(vec![image.to_uri()]),
        )?;
        Ok(format!(
            "Generated and added image to segment '{}'",
            segment_title
        ))
    }

    pub fn add_research(&mut self, text: &str, replace: bool) -> String {
        self.document.set_research(text, replace);
        format!(
            "Research document updated. Length: {} characters",
            self.document.research_notes().chars().count()
        )
    }

    pub fn add_citation(&mut self, source: &str) -> Result<String, ToolError> {
        self.document
            .add_citation(source)
            .map_err(domain_to_tool_error)?;
        Ok(format!(
            "Citation recorded ({} total)",
            self.document.citations().len()
        ))
    }

    pub async fn web_search(&mut self, query: &str) -> Result<(String, usize), ToolError> {
        let hits = self
            .search
            .search(query, self.search_max_results)
            .await
            .map_err(|e| ToolError::execution_failed(format!("Error searching the web: {}", e)))?;

        let formatted = format_hits(&hits);
        let block = format!("\n\n--- Search Query: {} ---\n{}", query, formatted);
        self.document.set_research(&block, false);

        Ok((
            format!(
                "Search completed. Found {} results. Results have been added to the research document.\n\n{}",
                hits.len(),
                formatted
            ),
            hits.len(),
        ))
    }

    pub fn get_story_json(&self) -> Result<String, ToolError> {
        let record = self.document.serialize().with_images_elided();
        serde_json::to_string_pretty(&record)
            .map_err(|e| ToolError::execution_failed(e.to_string()))
    }

    pub fn get_story_segments(&self) -> String {
        let titles = self.document.segment_titles();
        if titles.is_empty() {
            "No segments have been created yet.".to_string()
        } else {
            format!("Story segments: {}", titles.join(", "))
        }
    }

    pub fn save(&mut self, version_label: &str) -> Result<PathBuf, ToolError> {
        self.document
            .check_publishable()
            .map_err(domain_to_tool_error)?;
        let path = self
            .store
            .save_version(&self.document, version_label)
            .map_err(|e| ToolError::execution_failed(format!("Error saving story: {}", e)))?;
        self.saved_path = Some(path.clone());
        self.saved_document = Some(self.document.clone());
        if !self.saved_versions.iter().any(|v| v == version_label) {
            self.saved_versions.push(version_label.to_string());
        }
        Ok(path)
    }

    // ==================== Helpers ====================

    fn write(&mut self, segment_title: &str, write: SectionWrite) -> Result<(), ToolError> {
        match self.document.write_section(segment_title, write) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Err(self.segment_not_found(segment_title)),
            Err(e) => Err(domain_to_tool_error(e)),
        }
    }

    fn segment_not_found(&self, segment_title: &str) -> ToolError {
        let titles = self.document.segment_titles();
        let hint = if titles.is_empty() {
            "the story has no segments yet; add one with add_story_segment first".to_string()
        } else {
            format!("existing segments: {}", titles.join(", "))
        };
        domain_to_tool_error(DomainError::SegmentNotFound(segment_title.to_string()))
            .with_details(hint)
    }

    async fn run_tool(&mut self, tool: AuthoringTool, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let name = tool.name();
        let arg = |key: &str| call.require_string(key).map_err(ToolError::invalid_argument);
        let replace = call.get_bool("replace").unwrap_or(false);

        let result = match tool {
            AuthoringTool::SetTitle => ToolResult::success(name, self.set_title(arg("title")?)),
            AuthoringTool::AddSegment => ToolResult::success(
                name,
                self.add_segment(arg("title")?, call.get_string("text").unwrap_or("")),
            ),
            AuthoringTool::WriteSegmentText => ToolResult::success(
                name,
                self.write_segment_text(arg("segment_title")?, arg("text")?, replace)?,
            ),
            AuthoringTool::AddSegmentImage => ToolResult::success(
                name,
                self.add_segment_image(arg("segment_title")?, arg("image_url")?, replace)?,
            ),
            AuthoringTool::GenerateAndAddImage => {
                let size = match call.get_string("size") {
                    Some(s) => s.parse().map_err(domain_to_tool_error)?,
                    None => ImageSize::default(),
                };
                let output = self
                    .generate_and_add_image(arg("segment_title")?, arg("prompt")?, size)
                    .await?;
                ToolResult::success(name, output)
            }
            AuthoringTool::AddResearch => {
                ToolResult::success(name, self.add_research(arg("research_text")?, replace))
            }
            AuthoringTool::AddCitation => {
                ToolResult::success(name, self.add_citation(arg("source")?)?)
            }
            AuthoringTool::WebSearch => {
                let (output, count) = self.web_search(arg("query")?).await?;
                ToolResult::success(name, output).with_match_count(count)
            }
            AuthoringTool::GetStoryJson => ToolResult::success(name, self.get_story_json()?),
            AuthoringTool::GetStorySegments => ToolResult::success(name, self.get_story_segments()),
            AuthoringTool::SaveStory => {
                let path = self.save(arg("version_name")?)?;
                ToolResult::success(
                    name,
                    format!("Story successfully saved to {}", path.display()),
                )
                .with_path(path.display().to_string())
            }
        };
        Ok(result)
    }

    fn into_outcome(
        self,
        ctx: &ConversationContext,
        turns: usize,
        final_text: String,
        exhausted: bool,
    ) -> AuthoringOutcome {
        let state = if self.state != AuthoringState::Saved && self.document.is_rejection() {
            AuthoringState::Rejected
        } else {
            self.state
        };
        let unsaved_changes = self.has_unsaved_changes();
        AuthoringOutcome {
            document: self.document,
            state,
            saved_path: self.saved_path,
            saved_document: self.saved_document,
            saved_versions: self.saved_versions,
            unsaved_changes,
            turns,
            conversation_id: ctx.conversation_id().to_string(),
            final_text,
            exhausted,
        }
    }
}

#[async_trait]
impl ToolSurface for AuthoringSession {
    fn kind(&self) -> SessionKind {
        SessionKind::Authoring
    }

    fn tool_spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn dispatch(
        &mut self,
        call: &ToolCall,
        progress: &dyn SessionProgressNotifier,
    ) -> ToolResult {
        let Some(tool) = AuthoringTool::from_name(&call.tool_name) else {
            return ToolResult::failure(
                &call.tool_name,
                ToolError::not_found(format!("tool '{}'", call.tool_name)),
            );
        };

        match self.run_tool(tool, call).await {
            Ok(result) => {
                match tool.transition() {
                    // Saved only ends with another save; later edits are
                    // tracked against the saved snapshot instead.
                    Some(next) if self.state == AuthoringState::Saved && next != self.state => {
                        debug!("{} changed the story after it was saved", tool.name());
                    }
                    Some(next) if next != self.state => {
                        info!("Authoring state {} → {}", self.state, next);
                        self.state = next;
                        progress.on_authoring_state(next);
                    }
                    _ => {}
                }
                result
            }
            Err(error) => {
                debug!("{} rejected: {}", tool.name(), error);
                ToolResult::failure(tool.name(), error)
            }
        }
    }
}

// ==================== Use case ====================

/// Result of one authoring run.
#[derive(Debug, Clone)]
pub struct AuthoringOutcome {
    pub document: Document,
    pub state: AuthoringState,
    /// Path of the last successful save, if any.
    pub saved_path: Option<PathBuf>,
    /// Document as it was persisted by the last save.
    pub saved_document: Option<Document>,
    /// Every version label saved during the run.
    pub saved_versions: Vec<String>,
    /// The in-memory document was edited after the last save.
    pub unsaved_changes: bool,
    pub turns: usize,
    pub conversation_id: String,
    /// Last text the model produced.
    pub final_text: String,
    /// The turn limit cut the run short.
    pub exhausted: bool,
}

impl AuthoringOutcome {
    pub fn is_saved(&self) -> bool {
        self.state == AuthoringState::Saved
    }

    pub fn is_rejected(&self) -> bool {
        self.state == AuthoringState::Rejected
    }

    /// The persisted snapshot when there is one, otherwise the working copy.
    pub fn stored_document(&self) -> &Document {
        self.saved_document.as_ref().unwrap_or(&self.document)
    }

    /// The story title, or [`SessionError::MissingTitle`] when the run never set one.
    pub fn require_title(&self) -> Result<&str, SessionError> {
        let title = self.document.title();
        if title.is_empty() {
            Err(SessionError::MissingTitle)
        } else {
            Ok(title)
        }
    }
}

/// Input for [`AuthorStoryUseCase`].
#[derive(Debug, Clone)]
pub struct AuthorStoryInput {
    pub location: StoryLocation,
    /// First user message.
    pub prompt: String,
    pub model: Model,
    pub execution: ExecutionParams,
}

impl AuthorStoryInput {
    /// A story about `topic`, stored under a slug of the topic.
    pub fn for_topic(topic: &str, model: Model, execution: ExecutionParams) -> Self {
        Self {
            location: StoryLocation::from_topic(topic),
            prompt: AuthoringPromptTemplate::topic(topic),
            model,
            execution,
        }
    }

    /// A story on a topic of the model's choosing.
    pub fn random_topic(location: StoryLocation, model: Model, execution: ExecutionParams) -> Self {
        Self {
            location,
            prompt: AuthoringPromptTemplate::random_topic().to_string(),
            model,
            execution,
        }
    }
}

/// Use case for writing one story.
pub struct AuthorStoryUseCase {
    gateway: Arc<dyn LlmGateway>,
    tool_schema: Arc<dyn ToolSchemaPort>,
    store: Arc<dyn StoryStore>,
    search: Arc<dyn SearchProvider>,
    images: Arc<dyn ImageProvider>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl Clone for AuthorStoryUseCase {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            tool_schema: self.tool_schema.clone(),
            store: self.store.clone(),
            search: self.search.clone(),
            images: self.images.clone(),
            conversation_logger: self.conversation_logger.clone(),
        }
    }
}

impl AuthorStoryUseCase {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        tool_schema: Arc<dyn ToolSchemaPort>,
        store: Arc<dyn StoryStore>,
        search: Arc<dyn SearchProvider>,
        images: Arc<dyn ImageProvider>,
    ) -> Self {
        Self {
            gateway,
            tool_schema,
            store,
            search,
            images,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub async fn execute(
        &self,
        input: AuthorStoryInput,
        progress: &dyn SessionProgressNotifier,
    ) -> Result<AuthoringOutcome, SessionError> {
        let mut ctx = ConversationContext::new();
        info!(
            "Starting authoring session {} for '{}' with {}",
            ctx.conversation_id(),
            input.location,
            input.model
        );
        progress.on_session_start(SessionKind::Authoring, input.location.as_str());
        self.conversation_logger.log(ConversationEvent::new(
            "session_start",
            ctx.conversation_id(),
            serde_json::json!({
                "kind": SessionKind::Authoring.as_str(),
                "model": input.model.to_string(),
                "location": input.location.as_str(),
                "prompt": input.prompt,
            }),
        ));

        let session = self
            .gateway
            .create_session_with_system_prompt(&input.model, AuthoringPromptTemplate::system())
            .await?;

        let mut surface = AuthoringSession::new(
            input.location,
            self.store.clone(),
            self.search.clone(),
            self.images.clone(),
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
        let summary = tool_loop.run(&input.prompt, &mut surface, &mut ctx).await?;

        let outcome = surface.into_outcome(&ctx, summary.turns, summary.final_text, summary.exhausted);
        info!(
            "Authoring session {} finished: {} after {} tool turns",
            outcome.conversation_id, outcome.state, outcome.turns
        );
        progress.on_session_end(SessionKind::Authoring, outcome.turns);
        self.conversation_logger.log(ConversationEvent::new(
            "session_end",
            ctx.conversation_id(),
            serde_json::json!({
                "kind": SessionKind::Authoring.as_str(),
                "state": outcome.state.as_str(),
                "turns": outcome.turns,
                "exhausted": outcome.exhausted,
                "saved_path": outcome.saved_path.as_ref().map(|p| p.display().to_string()),
                "saved_versions": outcome.saved_versions,
                "unsaved_changes": outcome.unsaved_changes,
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
    use storytime_domain::DocumentRecord;

    fn session() -> (AuthoringSession, Arc<MemoryStoryStore>, Arc<MockSearch>, Arc<MockImages>) {
        let store = Arc::new(MemoryStoryStore::default());
        let search = Arc::new(MockSearch::default());
        let images = Arc::new(MockImages::default());
        let session = AuthoringSession::new(
            StoryLocation::new("press").unwrap(),
            store.clone(),
            search.clone(),
            images.clone(),
        );
        (session, store, search, images)
    }

    fn use_case(
        gateway: ScriptedGateway,
    ) -> (AuthorStoryUseCase, Arc<MemoryStoryStore>, Arc<MockImages>) {
        let store = Arc::new(MemoryStoryStore::default());
        let images = Arc::new(MockImages::default());
        let uc = AuthorStoryUseCase::new(
            Arc::new(gateway),
            Arc::new(PassthroughSchema),
            store.clone(),
            Arc::new(MockSearch::default()),
            images.clone(),
        );
        (uc, store, images)
    }

    fn input(execution: ExecutionParams) -> AuthorStoryInput {
        AuthorStoryInput::for_topic("The Printing Press", Model::default(), execution)
    }

    // ==================== Session operations ====================

    #[test]
    fn test_tool_names_round_trip() {
        for tool in AuthoringTool::ALL {
            assert_eq!(AuthoringTool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(authoring_tool_spec().len(), AuthoringTool::ALL.len());
        assert_eq!(
            authoring_tool_spec().resolve("perplexity_search"),
            Some("web_search")
        );
    }

    #[test]
    fn test_write_to_missing_segment_lists_existing() {
        let (mut s, _, _, _) = session();
        s.add_segment("Mainz", "");
        let err = s.write_segment_text("Strasbourg", "x", false).unwrap_err();
        assert_eq!(err.code, "NOT_FOUND");
        assert!(err.to_string().contains("existing segments: Mainz"));
        assert_eq!(s.document().segments()[0].text, "");
    }

    #[test]
    fn test_duplicate_segment_warns() {
        let (mut s, _, _, _) = session();
        assert!(!s.add_segment("Intro", "").contains("Warning"));
        assert!(s.add_segment("Intro", "").contains("Warning"));
        assert_eq!(s.document().segments().len(), 2);
    }

    #[test]
    fn test_save_preconditions_and_idempotence() {
        let (mut s, store, _, _) = session();
        let err = s.save("v1").unwrap_err();
        assert_eq!(err.code, "INVALID_ARGUMENT");
        assert!(err.message.starts_with("Story title is not set"));

        s.set_title("The Press");
        s.add_segment("Mainz", "In 1440");
        assert!(s.save("v1").unwrap_err().message.contains("research"));

        s.add_citation("https://example.org/gutenberg").unwrap();
        let first = s.save("v1").unwrap();
        let second = s.save("v1").unwrap();
        assert_eq!(first, second);
        assert_eq!(store.file_names(), vec!["press-v1.json"]);
    }

    #[tokio::test]
    async fn test_generate_image_checks_segment_before_provider() {
        let (mut s, _, _, images) = session();
        let err = s
            .generate_and_add_image("Missing", "a press", ImageSize::Square)
            .await
            .unwrap_err();
        assert_eq!(err.code, "NOT_FOUND");
        assert_eq!(images.calls(), 0);

        s.add_segment("Mainz", "");
        s.generate_and_add_image("Mainz", "a press", ImageSize::Landscape)
            .await
            .unwrap();
        assert_eq!(images.calls(), 1);
        assert_eq!(
            s.document().segment("Mainz").unwrap().images,
            vec!["data:image/png;base64,aW1hZ2U="]
        );
    }

    #[tokio::test]
    async fn test_image_provider_failure_leaves_segment_unchanged() {
        let (mut s, _, _, images) = session();
        images.fail_with("rate limited");
        s.add_segment("Mainz", "");
        let err = s
            .generate_and_add_image("Mainz", "a press", ImageSize::Square)
            .await
            .unwrap_err();
        assert_eq!(err.code, "EXECUTION_FAILED");
        assert!(err.message.contains("rate limited"));
        assert!(s.document().segment("Mainz").unwrap().images.is_empty());
    }

    #[tokio::test]
    async fn test_web_search_appends_to_research() {
        let (mut s, _, search, _) = session();
        s.add_research("Initial notes", false);
        let (output, count) = s.web_search("gutenberg press").await.unwrap();

        assert_eq!(count, 2);
        assert_eq!(search.queries(), vec!["gutenberg press"]);
        assert!(output.starts_with("Search completed. Found 2 results."));
        let notes = s.document().research_notes();
        assert!(notes.starts_with("Initial notes\n\n\n--- Search Query: gutenberg press ---\nTitle: Gutenberg"));
        assert!(notes.contains("URL: https://example.org/gutenberg"));
    }

    #[test]
    fn test_get_story_json_elides_images() {
        let (mut s, _, _, _) = session();
        s.add_segment("Mainz", "");
        s.add_segment_image("Mainz", "data:image/png;base64,AAAA", false).unwrap();
        let json = s.get_story_json().unwrap();
        assert!(json.contains("[1 images - data excluded to save tokens]"));
        assert!(!json.contains("AAAA"));
    }

    #[test]
    fn test_get_story_segments() {
        let (mut s, _, _, _) = session();
        assert_eq!(s.get_story_segments(), "No segments have been created yet.");
        s.add_segment("One", "");
        s.add_segment("Two", "");
        assert_eq!(s.get_story_segments(), "Story segments: One, Two");
    }

    #[tokio::test]
    async fn test_dispatch_transitions_only_on_success() {
        let (mut s, _, _, _) = session();
        let failed = s
            .dispatch(
                &ToolCall::new("write_segment_text")
                    .with_arg("segment_title", "Nope")
                    .with_arg("text", "x"),
                &NoProgress,
            )
            .await;
        assert!(!failed.is_success());
        assert_eq!(s.state(), AuthoringState::Idle);

        s.dispatch(&ToolCall::new("set_story_title").with_arg("title", "T"), &NoProgress)
            .await;
        assert_eq!(s.state(), AuthoringState::Drafting);

        s.dispatch(&ToolCall::new("get_story_segments"), &NoProgress).await;
        assert_eq!(s.state(), AuthoringState::Drafting);

        s.dispatch(
            &ToolCall::new("add_citation").with_arg("source", "https://a"),
            &NoProgress,
        )
        .await;
        assert_eq!(s.state(), AuthoringState::Researching);
    }

    #[tokio::test]
    async fn test_dispatch_rejects_bad_image_size() {
        let (mut s, _, _, images) = session();
        s.add_segment("Mainz", "");
        let result = s
            .dispatch(
                &ToolCall::new("generate_and_add_image")
                    .with_arg("segment_title", "Mainz")
                    .with_arg("prompt", "p")
                    .with_arg("size", "10x10"),
                &NoProgress,
            )
            .await;
        assert_eq!(result.error().unwrap().code, "INVALID_ARGUMENT");
        assert_eq!(images.calls(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_add_segment_image_can_replace() {
        let (mut s, _, _, _) = session();
        s.add_segment("Mainz", "");
        s.add_segment_image("Mainz", "https://img/old.png", false).unwrap();

        let appended = s
            .dispatch(
                &ToolCall::new("add_segment_image")
                    .with_arg("segment_title", "Mainz")
                    .with_arg("image_url", "https://img/second.png"),
                &NoProgress,
            )
            .await;
        assert!(appended.is_success());
        assert_eq!(s.document().segment("Mainz").unwrap().images.len(), 2);

        let replaced = s
            .dispatch(
                &ToolCall::new("add_segment_image")
                    .with_arg("segment_title", "Mainz")
                    .with_arg("image_url", "https://img/new.png")
                    .with_arg("replace", true),
                &NoProgress,
            )
            .await;
        assert!(replaced.is_success());
        assert_eq!(
            s.document().segment("Mainz").unwrap().images,
            vec!["https://img/new.png"]
        );
        assert_eq!(s.state(), AuthoringState::Illustrating);
    }

    #[tokio::test]
    async fn test_saved_state_survives_later_edits() {
        let (mut s, _, _, _) = session();
        s.dispatch(&ToolCall::new("set_story_title").with_arg("title", "T"), &NoProgress)
            .await;
        s.dispatch(
            &ToolCall::new("add_story_segment").with_arg("title", "Mainz"),
            &NoProgress,
        )
        .await;
        s.dispatch(
            &ToolCall::new("add_citation").with_arg("source", "https://a"),
            &NoProgress,
        )
        .await;
        s.dispatch(&ToolCall::new("save_story").with_arg("version_name", "v1"), &NoProgress)
            .await;
        assert_eq!(s.state(), AuthoringState::Saved);
        assert!(!s.has_unsaved_changes());

        // A citation is not persisted, so it is not an unsaved change
        s.dispatch(
            &ToolCall::new("add_citation").with_arg("source", "https://b"),
            &NoProgress,
        )
        .await;
        assert!(!s.has_unsaved_changes());

        s.dispatch(
            &ToolCall::new("write_segment_text")
                .with_arg("segment_title", "Mainz")
                .with_arg("text", "late"),
            &NoProgress,
        )
        .await;
        assert_eq!(s.state(), AuthoringState::Saved);
        assert!(s.has_unsaved_changes());

        s.dispatch(&ToolCall::new("save_story").with_arg("version_name", "v2"), &NoProgress)
            .await;
        assert!(!s.has_unsaved_changes());
    }

    // ==================== End-to-end ====================

    #[tokio::test]
    async fn test_scripted_story_is_saved_with_segments_in_order() {
        let gateway = ScriptedGateway::new(vec![vec![
            tool_response(vec![("c1", "set_story_title", json!({"title": "The Press"}))]),
            tool_response(vec![
                ("c2", "add_story_segment", json!({"title": "Mainz", "text": "In 1440, "})),
                ("c3", "add_story_segment", json!({"title": "Spread", "text": "By 1500"})),
                ("c4", "write_segment_text", json!({"segment_title": "Mainz", "text": "a goldsmith"})),
            ]),
            tool_response(vec![(
                "c5",
                "add_research_document",
                json!({"research_text": "Gutenberg biography notes"}),
            )]),
            tool_response(vec![("c6", "save_story", json!({"version_name": "v1"}))]),
            text_response("The story is saved."),
        ]]);
        let sent = gateway.sent_results();
        let (uc, store, _) = use_case(gateway);

        let outcome = uc
            .execute(input(ExecutionParams::default()), &NoProgress)
            .await
            .unwrap();

        assert_eq!(outcome.state, AuthoringState::Saved);
        assert!(outcome.is_saved());
        assert_eq!(outcome.turns, 4);
        assert_eq!(outcome.final_text, "The story is saved.");
        assert_eq!(outcome.require_title().unwrap(), "The Press");

        let raw = store.load("the_printing_press-v1.json").unwrap().unwrap();
        let record: DocumentRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(record.title, "The Press");
        let titles: Vec<_> = record.segments.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Mainz", "Spread"]);
        assert_eq!(record.segments[0].text, "In 1440, a goldsmith");
        assert_eq!(record.research_document, "Gutenberg biography notes");

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 6);
        assert!(sent.iter().all(|r| !r.is_error));
        assert_eq!(sent[3].tool_use_id, "c4");
    }

    #[tokio::test]
    async fn test_edit_after_save_is_reported_not_persisted() {
        let gateway = ScriptedGateway::new(vec![vec![
            tool_response(vec![("c1", "set_story_title", json!({"title": "The Press"}))]),
            tool_response(vec![(
                "c2",
                "add_story_segment",
                json!({"title": "Mainz", "text": "x"}),
            )]),
            tool_response(vec![(
                "c3",
                "add_research_document",
                json!({"research_text": "notes"}),
            )]),
            tool_response(vec![("c4", "save_story", json!({"version_name": "v1"}))]),
            tool_response(vec![(
                "c5",
                "write_segment_text",
                json!({"segment_title": "Mainz", "text": " UNSAVED"}),
            )]),
            text_response("Done."),
        ]]);
        let (uc, store, _) = use_case(gateway);

        let outcome = uc
            .execute(input(ExecutionParams::default()), &NoProgress)
            .await
            .unwrap();

        assert_eq!(outcome.state, AuthoringState::Saved);
        assert!(outcome.is_saved());
        assert!(outcome.unsaved_changes);
        assert_eq!(outcome.saved_versions, vec!["v1"]);
        assert_eq!(outcome.document.segments()[0].text, "x UNSAVED");
        assert_eq!(outcome.stored_document().segments()[0].text, "x");

        let raw = store.load("the_printing_press-v1.json").unwrap().unwrap();
        assert!(!raw.contains("UNSAVED"));
    }

    #[tokio::test]
    async fn test_rejected_topic() {
        let gateway = ScriptedGateway::new(vec![vec![
            tool_response(vec![(
                "c1",
                "set_story_title",
                json!({"title": "Unable to publish story: This topic is fictional"}),
            )]),
            text_response("Rejected."),
        ]]);
        let (uc, store, _) = use_case(gateway);

        let outcome = uc
            .execute(input(ExecutionParams::default()), &NoProgress)
            .await
            .unwrap();

        assert!(outcome.is_rejected());
        assert!(outcome.document.segments().is_empty());
        assert!(outcome.saved_path.is_none());
        assert!(store.file_names().is_empty());
    }

    #[tokio::test]
    async fn test_missing_title_is_reported() {
        let gateway = ScriptedGateway::new(vec![vec![text_response("I will not do anything.")]]);
        let (uc, _, _) = use_case(gateway);

        let outcome = uc
            .execute(input(ExecutionParams::default()), &NoProgress)
            .await
            .unwrap();

        assert_eq!(outcome.state, AuthoringState::Idle);
        assert!(matches!(
            outcome.require_title(),
            Err(SessionError::MissingTitle)
        ));
    }

    #[tokio::test]
    async fn test_tool_errors_are_returned_to_model() {
        let gateway = ScriptedGateway::new(vec![vec![
            tool_response(vec![
                ("c1", "add_segment_image", json!({"segment_title": "Nope", "image_url": "u"})),
                ("c2", "summon_dragon", json!({})),
                ("c3", "perplexity_search", json!({"query": "gutenberg"})),
                ("c4", "set_story_title", json!({})),
            ]),
            text_response("Done."),
        ]]);
        let sent = gateway.sent_results();
        let (uc, _, _) = use_case(gateway);

        let outcome = uc
            .execute(input(ExecutionParams::default()), &NoProgress)
            .await
            .unwrap();

        let sent = sent.lock().unwrap();
        assert!(sent[0].is_error && sent[0].output.contains("NOT_FOUND"));
        assert!(sent[1].is_error && sent[1].output.contains("summon_dragon"));
        assert!(!sent[2].is_error, "alias should resolve: {}", sent[2].output);
        assert!(sent[3].is_error && sent[3].output.contains("INVALID_ARGUMENT"));
        assert_eq!(outcome.state, AuthoringState::Researching);
    }

    #[tokio::test]
    async fn test_turn_limit_stops_loop() {
        let responses = (0..10)
            .map(|i| {
                tool_response(vec![(
                    &*format!("c{i}"),
                    "add_story_segment",
                    json!({"title": format!("S{i}")}),
                )])
            })
            .collect();
        let gateway = ScriptedGateway::new(vec![responses]);
        let (uc, _, _) = use_case(gateway);

        let outcome = uc
            .execute(
                input(ExecutionParams::default().with_max_tool_turns(3)),
                &NoProgress,
            )
            .await
            .unwrap();

        assert!(outcome.exhausted);
        assert_eq!(outcome.turns, 3);
        assert_eq!(outcome.document.segments().len(), 3);
        assert_eq!(outcome.state, AuthoringState::Segmenting);
    }

    #[tokio::test]
    async fn test_gateway_error_ends_session() {
        let gateway = ScriptedGateway::with_scripts(vec![vec![Scripted::Error("boom".into())]]);
        let (uc, _, _) = use_case(gateway);

        let err = uc
            .execute(input(ExecutionParams::default()), &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::GatewayError(_)));
    }
}
