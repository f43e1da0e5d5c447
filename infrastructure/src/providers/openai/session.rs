//! OpenAI chat session.
//!
//! Provides [`OpenAiSession`], which implements [`LlmSession`] by keeping the
//! whole message history and replaying it on every chat completions call.

use super::types::{ChatRequest, ChatResponse, WireMessage, to_function_tool, to_llm_response};
use crate::providers::http::JsonClient;
use async_trait::async_trait;
use std::sync::Mutex;
use storytime_application::ports::llm_gateway::{GatewayError, LlmSession, ToolResultMessage};
use storytime_domain::{LlmResponse, Model};
use tracing::debug;

pub struct OpenAiSession {
    client: JsonClient,
    model: Model,
    max_tokens: u32,
    history: Mutex<Vec<WireMessage>>,
    /// Function tools from the last `send_with_tools`, resent with tool results
    tools: Mutex<Vec<serde_json::Value>>,
}

impl OpenAiSession {
    pub(crate) fn new(client: JsonClient, model: Model, max_tokens: u32, system_prompt: &str) -> Self {
        Self {
            client,
            model,
            max_tokens,
            history: Mutex::new(vec![WireMessage::system(system_prompt)]),
            tools: Mutex::new(Vec::new()),
        }
    }

    fn push(&self, messages: impl IntoIterator<Item = WireMessage>) -> Result<Vec<WireMessage>, GatewayError> {
        let mut history = self
            .history
            .lock()
            .map_err(|_| GatewayError::Other("session history lock poisoned".into()))?;
        history.extend(messages);
        Ok(history.clone())
    }

    fn tools(&self) -> Result<Vec<serde_json::Value>, GatewayError> {
        self.tools
            .lock()
            .map(|t| t.clone())
            .map_err(|_| GatewayError::Other("session tools lock poisoned".into()))
    }

    async fn complete(&self, messages: Vec<WireMessage>) -> Result<LlmResponse, GatewayError> {
        let tools = self.tools()?;
        let (max_tokens, max_completion_tokens) = if self.model.uses_max_completion_tokens() {
            (None, Some(self.max_tokens))
        } else {
            (Some(self.max_tokens), None)
        };
        let request = ChatRequest {
            model: self.model.as_str(),
            messages: &messages,
            tools: &tools,
            tool_choice: (!tools.is_empty()).then_some("auto"),
            max_tokens,
            max_completion_tokens,
        };

        debug!(
            "OpenAI chat request: model {}, {} messages, {} tools",
            self.model,
            messages.len(),
            tools.len()
        );
        let response: ChatResponse = self.client.post("chat/completions", &request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::InvalidResponse("no choices in response".into()))?;
        let llm = to_llm_response(
            &choice.message,
            choice.finish_reason.as_deref(),
            response.model,
        );
        self.push([choice.message])?;
        Ok(llm)
    }
}

#[async_trait]
impl LlmSession for OpenAiSession {
    fn model(&self) -> &Model {
        &self.model
    }

    async fn send_with_tools(
        &self,
        content: &str,
        tools: &[serde_json::Value],
    ) -> Result<LlmResponse, GatewayError> {
        {
            let mut current = self
                .tools
                .lock()
                .map_err(|_| GatewayError::Other("session tools lock poisoned".into()))?;
            *current = tools.iter().map(to_function_tool).collect();
        }
        let messages = self.push([WireMessage::user(content)])?;
        self.complete(messages).await
    }

    async fn send_tool_results(
        &self,
        results: &[ToolResultMessage],
    ) -> Result<LlmResponse, GatewayError> {
        let messages = self.push(results.iter().map(WireMessage::tool))?;
        self.complete(messages).await
    }
}
