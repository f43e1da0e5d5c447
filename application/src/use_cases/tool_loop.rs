//! Native tool-use loop shared by the authoring and evaluation sessions.
//!
//! ```text
//! send_with_tools(prompt)
//!   └─▶ response ── tool calls? ──no──▶ done
//!                      │yes
//!                      ▼
//!          resolve alias → validate → dispatch (one at a time, in order)
//!                      │
//!                      ▼
//!          send_tool_results(results) ─▶ response ─▶ …
//! ```
//!
//! Calls within one response run sequentially: a segment lookup followed by
//! a write is only meaningful if nothing runs in between.

use super::error::SessionError;
use super::tool_helpers::tool_args_preview;
use crate::config::ExecutionParams;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger};
use crate::ports::llm_gateway::{GatewayError, LlmSession, ToolResultMessage};
use crate::ports::progress::{SessionKind, SessionProgressNotifier};
use async_trait::async_trait;
use std::future::Future;
use std::time::Instant;
use storytime_domain::core::string::preview;
use storytime_domain::{
    ConversationContext, DefaultToolValidator, LlmResponse, ToolCall, ToolError, ToolResult,
    ToolSpec, ToolValidator,
};
use tracing::{debug, warn};

/// A fixed set of operations a session exposes to the model.
#[async_trait]
pub trait ToolSurface: Send {
    fn kind(&self) -> SessionKind;

    fn tool_spec(&self) -> &ToolSpec;

    /// Execute one call. `call.tool_name` is always a canonical name and the
    /// arguments have passed [`DefaultToolValidator`].
    async fn dispatch(
        &mut self,
        call: &ToolCall,
        progress: &dyn SessionProgressNotifier,
    ) -> ToolResult;
}

/// How a tool loop ended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopSummary {
    /// Tool turns executed.
    pub turns: usize,
    /// Last non-empty text the model produced.
    pub final_text: String,
    /// The model still wanted tools when the turn limit was hit.
    pub exhausted: bool,
}

pub(crate) struct ToolLoop<'a> {
    pub session: &'a dyn LlmSession,
    pub tools: &'a [serde_json::Value],
    pub execution: &'a ExecutionParams,
    pub progress: &'a dyn SessionProgressNotifier,
    pub logger: &'a dyn ConversationLogger,
}

impl ToolLoop<'_> {
    pub async fn run(
        &self,
        prompt: &str,
        surface: &mut dyn ToolSurface,
        ctx: &mut ConversationContext,
    ) -> Result<LoopSummary, SessionError> {
        let kind = surface.kind();
        let max_turns = self.execution.max_tool_turns;
        let mut summary = LoopSummary::default();

        let mut response = self
            .bounded(self.session.send_with_tools(prompt, self.tools))
            .await?;
        if response.is_empty() {
            return Err(SessionError::EmptyResponse);
        }
        self.record_text(&response, ctx, &mut summary);

        loop {
            let tool_calls = response.tool_calls();
            if tool_calls.is_empty() {
                break;
            }

            if summary.turns >= max_turns {
                warn!(
                    "{} session exceeded max_tool_turns ({}); stopping",
                    kind, max_turns
                );
                summary.exhausted = true;
                break;
            }
            summary.turns = ctx.next_turn();
            self.progress.on_tool_turn(kind, summary.turns, max_turns);

            let mut results = Vec::with_capacity(tool_calls.len());
            for call in &tool_calls {
                let result = self.execute_one(call, surface, ctx).await;
                match call.native_id.clone() {
                    Some(native_id) => results.push(ToolResultMessage {
                        tool_use_id: native_id,
                        tool_name: call.tool_name.clone(),
                        output: result.model_text(),
                        is_error: !result.is_success(),
                    }),
                    None => warn!(
                        "Missing native_id for tool call '{}'; skipping result.",
                        call.tool_name
                    ),
                }
            }

            debug!(
                "{} tool turn {}/{}: sending {} tool results",
                kind,
                summary.turns,
                max_turns,
                results.len()
            );
            response = self
                .bounded(self.session.send_tool_results(&results))
                .await?;
            self.record_text(&response, ctx, &mut summary);
        }

        Ok(summary)
    }

    async fn execute_one(
        &self,
        call: &ToolCall,
        surface: &mut dyn ToolSurface,
        ctx: &ConversationContext,
    ) -> ToolResult {
        let args_preview = tool_args_preview(call);
        self.progress.on_tool_call(&call.tool_name, &args_preview);
        self.logger.log(ConversationEvent::new(
            "tool_call",
            ctx.conversation_id(),
            serde_json::json!({
                "turn": ctx.turns(),
                "tool": call.tool_name,
                "native_id": call.native_id,
                "arguments": call.arguments,
            }),
        ));

        let started = Instant::now();
        let checked = {
            let spec = surface.tool_spec();
            match spec.get_resolved(&call.tool_name) {
                None => Err(ToolError::not_found(format!("tool '{}'", call.tool_name))
                    .with_details(format!(
                        "available tools: {}",
                        spec.names().collect::<Vec<_>>().join(", ")
                    ))),
                Some(definition) => DefaultToolValidator
                    .validate(call, definition)
                    .map(|()| definition.name.clone())
                    .map_err(ToolError::invalid_argument),
            }
        };

        let result = match checked {
            Ok(canonical) => {
                if canonical != call.tool_name {
                    debug!("Resolved tool alias '{}' → '{}'", call.tool_name, canonical);
                }
                let mut resolved = call.clone();
                resolved.tool_name = canonical;
                surface.dispatch(&resolved, self.progress).await
            }
            Err(error) => ToolResult::failure(&call.tool_name, error),
        };
        let result = result.with_duration(started.elapsed().as_millis() as u64);

        let text = result.model_text();
        self.progress
            .on_tool_result(&result.tool_name, result.is_success(), &preview(&text, 100));
        self.logger.log(ConversationEvent::new(
            "tool_result",
            ctx.conversation_id(),
            serde_json::json!({
                "tool": result.tool_name,
                "success": result.is_success(),
                "duration_ms": result.metadata.duration_ms,
                "output": text,
            }),
        ));
        if !result.is_success() {
            debug!("Tool '{}' failed: {}", result.tool_name, text);
        }
        result
    }

    fn record_text(
        &self,
        response: &LlmResponse,
        ctx: &ConversationContext,
        summary: &mut LoopSummary,
    ) {
        let text = response.text_content();
        if text.trim().is_empty() {
            return;
        }
        self.progress.on_llm_text(&text);
        self.logger.log(ConversationEvent::new(
            "llm_text",
            ctx.conversation_id(),
            serde_json::json!({ "text": text, "model": response.model }),
        ));
        summary.final_text = text;
    }

    async fn bounded<F>(&self, call: F) -> Result<LlmResponse, SessionError>
    where
        F: Future<Output = Result<LlmResponse, GatewayError>>,
    {
        match self.execution.llm_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| SessionError::Timeout(limit))?
                .map_err(SessionError::from),
            None => call.await.map_err(SessionError::from),
        }
    }
}
