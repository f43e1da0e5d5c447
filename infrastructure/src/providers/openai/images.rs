//! OpenAI image generation adapter.

use crate::config::{ConfigError, FileOpenAiConfig};
use crate::providers::http::JsonClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storytime_application::ports::content_provider::{ImageProvider, ProviderError};
use storytime_domain::{GeneratedImage, ImageSize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'static str,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

impl ImageResponse {
    fn into_image(self) -> Result<GeneratedImage, ProviderError> {
        let first = self
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("no image in response".into()))?;
        match (first.url, first.b64_json) {
            (Some(url), _) => Ok(GeneratedImage::Url(url)),
            (None, Some(base64)) => Ok(GeneratedImage::Inline { base64 }),
            (None, None) => Err(ProviderError::InvalidResponse(
                "image has neither url nor b64_json".into(),
            )),
        }
    }
}

pub struct OpenAiImageGenerator {
    client: JsonClient,
    model: String,
}

impl OpenAiImageGenerator {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: JsonClient::new(base_url, api_key),
            model: model.to_string(),
        }
    }

    pub fn from_config(config: &FileOpenAiConfig) -> Result<Self, ConfigError> {
        let api_key = config.resolve_api_key()?;
        Ok(Self::new(&config.base_url, &api_key, &config.image_model))
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageGenerator {
    async fn generate(&self, prompt: &str, size: ImageSize) -> Result<GeneratedImage, ProviderError> {
        debug!("Generating {} image with {}", size, self.model);
        let request = ImageRequest {
            model: &self.model,
            prompt,
            size: size.as_str(),
            n: 1,
        };
        let response: ImageResponse = self.client.post("images/generations", &request).await?;
        response.into_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<GeneratedImage, ProviderError> {
        serde_json::from_str::<ImageResponse>(raw).unwrap().into_image()
    }

    #[test]
    fn test_url_preferred() {
        let image = parse(r#"{"data": [{"url": "https://img/1.png", "b64_json": "AAAA"}]}"#).unwrap();
        assert_eq!(image, GeneratedImage::Url("https://img/1.png".into()));
    }

    #[test]
    fn test_inline_fallback() {
        let image = parse(r#"{"data": [{"b64_json": "AAAA"}]}"#).unwrap();
        assert_eq!(image.to_uri(), "data:image/png;base64,AAAA");
    }

    #[test]
    fn test_empty_data_is_invalid() {
        assert!(matches!(
            parse(r#"{"data": []}"#),
            Err(ProviderError::InvalidResponse(_))
        ));
    }
}
