//! Content provider ports: web search and image generation.
//!
//! Sessions never perform network I/O themselves; they call these ports and
//! write the results into the document.

use async_trait::async_trait;
use storytime_domain::{GeneratedImage, ImageSize, SearchHit};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Missing credentials: environment variable {0} is not set")]
    MissingCredentials(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ProviderError>;
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate(&self, prompt: &str, size: ImageSize) -> Result<GeneratedImage, ProviderError>;
}
