//! Value objects exchanged with external content providers.
//!
//! The search and image providers themselves are application ports; these are
//! the provider-neutral shapes of what they return.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One web search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

impl SearchHit {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }
}

impl std::fmt::Display for SearchHit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Title: {}\nURL: {}\nSnippet: {}",
            self.title, self.url, self.snippet
        )
    }
}

/// Format hits the way they are shown to the model and stored in research notes.
pub fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Output of an image generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedImage {
    /// Hosted image.
    Url(String),
    /// Raw base64-encoded PNG.
    Inline { base64: String },
}

impl GeneratedImage {
    /// URI suitable for a segment's image list.
    pub fn to_uri(&self) -> String {
        match self {
            GeneratedImage::Url(url) => url.clone(),
            GeneratedImage::Inline { base64 } => format!("data:image/png;base64,{}", base64),
        }
    }
}

/// Supported image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1024x1024")]
    Square,
    #[serde(rename = "1792x1024")]
    Landscape,
    #[serde(rename = "1024x1792")]
    Portrait,
}

impl ImageSize {
    pub const ALL: [ImageSize; 3] = [ImageSize::Square, ImageSize::Landscape, ImageSize::Portrait];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Square => "1024x1024",
            ImageSize::Landscape => "1792x1024",
            ImageSize::Portrait => "1024x1792",
        }
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageSize::ALL
            .into_iter()
            .find(|size| size.as_str() == s.trim())
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "Unsupported image size '{}'; expected one of 1024x1024, 1792x1024, 1024x1792",
                    s
                ))
            })
    }
}
