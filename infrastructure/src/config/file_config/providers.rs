//! Provider configuration from TOML (`[providers]` section)

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};

fn resolve_key(
    provider: &'static str,
    api_key: Option<&String>,
    api_key_env: &str,
) -> Result<String, ConfigError> {
    if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
        return Ok(key.clone());
    }
    match std::env::var(api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ConfigError::MissingCredentials {
            provider,
            env: api_key_env.to_string(),
        }),
    }
}

/// OpenAI API configuration: chat completions and image generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOpenAiConfig {
    /// Environment variable name for the API key (default: "OPENAI_API_KEY").
    pub api_key_env: String,
    /// Direct API key. Prefer the environment variable.
    pub api_key: Option<String>,
    /// Base URL, including the version path.
    pub base_url: String,
    /// Max tokens per chat response.
    pub max_tokens: u32,
    /// Image generation model.
    pub image_model: String,
}

impl Default for FileOpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: 4096,
            image_model: "gpt-image-1".to_string(),
        }
    }
}

impl FileOpenAiConfig {
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        resolve_key("OpenAI", self.api_key.as_ref(), &self.api_key_env)
    }
}

/// Perplexity Search API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePerplexityConfig {
    /// Environment variable name for the API key (default: "PERPLEXITY_API_KEY").
    pub api_key_env: String,
    pub api_key: Option<String>,
    pub base_url: String,
    /// Results per search (default: 5)
    pub max_results: usize,
    /// Snippet budget per result page (default: 1024)
    pub max_tokens_per_page: u32,
}

impl Default for FilePerplexityConfig {
    fn default() -> Self {
        Self {
            api_key_env: "PERPLEXITY_API_KEY".to_string(),
            api_key: None,
            base_url: "https://api.perplexity.ai".to_string(),
            max_results: 5,
            max_tokens_per_page: 1024,
        }
    }
}

impl FilePerplexityConfig {
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        resolve_key("Perplexity", self.api_key.as_ref(), &self.api_key_env)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    pub openai: FileOpenAiConfig,
    pub perplexity: FilePerplexityConfig,
}
