//! Chat completions wire types and conversions to the domain response.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use storytime_application::ports::llm_gateway::ToolResultMessage;
use storytime_domain::{ContentBlock, LlmResponse, StopReason};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl WireMessage {
    fn plain(role: Role, content: &str) -> Self {
        Self {
            role,
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn system(content: &str) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: &str) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn tool(result: &ToolResultMessage) -> Self {
        Self {
            role: Role::Tool,
            content: Some(result.output.clone()),
            tool_calls: None,
            tool_call_id: Some(result.tool_use_id.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: WireFunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as the API sends them
    pub arguments: String,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [WireMessage],
    #[serde(skip_serializing_if = "no_tools")]
    pub tools: &'a [serde_json::Value],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
}

fn no_tools(tools: &&[serde_json::Value]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: WireMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Wrap a provider-neutral tool schema (`name`, `description`,
/// `input_schema`) in the chat completions function envelope.
pub fn to_function_tool(schema: &serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "type": "function",
        "function": {
            "name": schema["name"],
            "description": schema["description"],
            "parameters": schema["input_schema"],
        }
    })
}

/// Convert one choice into a domain response.
///
/// Unparsable tool arguments become an empty map; argument validation then
/// reports the missing parameters back to the model.
pub fn to_llm_response(message: &WireMessage, finish_reason: Option<&str>, model: Option<String>) -> LlmResponse {
    let mut content = Vec::new();

    if let Some(text) = message.content.as_deref().filter(|t| !t.is_empty()) {
        content.push(ContentBlock::Text(text.to_string()));
    }

    for call in message.tool_calls.iter().flatten() {
        let input: HashMap<String, serde_json::Value> =
            match serde_json::from_str(&call.function.arguments) {
                Ok(map) => map,
                Err(e) => {
                    warn!(
                        "Unparsable arguments for tool '{}': {}",
                        call.function.name, e
                    );
                    HashMap::new()
                }
            };
        content.push(ContentBlock::ToolUse {
            id: call.id.clone(),
            name: call.function.name.clone(),
            input,
        });
    }

    LlmResponse {
        content,
        stop_reason: finish_reason.map(StopReason::from_finish_reason),
        model,
    }
}
