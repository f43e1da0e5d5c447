//! OpenAI LLM Gateway implementation

use super::session::OpenAiSession;
use crate::config::{ConfigError, FileOpenAiConfig};
use crate::providers::http::JsonClient;
use async_trait::async_trait;
use storytime_application::ports::llm_gateway::{GatewayError, LlmGateway, LlmSession};
use storytime_domain::Model;
use tracing::info;

/// LLM Gateway for the OpenAI chat completions API
pub struct OpenAiGateway {
    client: JsonClient,
    max_tokens: u32,
}

impl OpenAiGateway {
    pub fn new(base_url: &str, api_key: &str, max_tokens: u32) -> Self {
        Self {
            client: JsonClient::new(base_url, api_key),
            max_tokens,
        }
    }

    /// Build from config, resolving the API key from the environment.
    pub fn from_config(config: &FileOpenAiConfig) -> Result<Self, ConfigError> {
        let api_key = config.resolve_api_key()?;
        info!("OpenAiGateway initialized ({})", config.base_url);
        Ok(Self::new(&config.base_url, &api_key, config.max_tokens))
    }
}

#[async_trait]
impl LlmGateway for OpenAiGateway {
    async fn create_session_with_system_prompt(
        &self,
        model: &Model,
        system_prompt: &str,
    ) -> Result<Box<dyn LlmSession>, GatewayError> {
        info!("Creating session with model: {}", model);
        Ok(Box::new(OpenAiSession::new(
            self.client.clone(),
            model.clone(),
            self.max_tokens,
            system_prompt,
        )))
    }
}
