//! Perplexity Search API adapter.

use super::http::JsonClient;
use crate::config::{ConfigError, FilePerplexityConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storytime_application::ports::content_provider::{ProviderError, SearchProvider};
use storytime_domain::SearchHit;
use tracing::debug;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
    max_tokens_per_page: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    snippet: String,
}

impl From<SearchResult> for SearchHit {
    fn from(r: SearchResult) -> Self {
        SearchHit::new(r.title, r.url, r.snippet)
    }
}

pub struct PerplexitySearch {
    client: JsonClient,
    max_tokens_per_page: u32,
}

impl PerplexitySearch {
    pub fn new(base_url: &str, api_key: &str, max_tokens_per_page: u32) -> Self {
        Self {
            client: JsonClient::new(base_url, api_key),
            max_tokens_per_page,
        }
    }

    pub fn from_config(config: &FilePerplexityConfig) -> Result<Self, ConfigError> {
        let api_key = config.resolve_api_key()?;
        Ok(Self::new(
            &config.base_url,
            &api_key,
            config.max_tokens_per_page,
        ))
    }
}

#[async_trait]
impl SearchProvider for PerplexitySearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, ProviderError> {
        debug!("Perplexity search: {}", query);
        let request = SearchRequest {
            query,
            max_results,
            max_tokens_per_page: self.max_tokens_per_page,
        };
        let response: SearchResponse = self.client.post("search", &request).await?;
        Ok(response
            .results
            .into_iter()
            .take(max_results)
            .map(SearchHit::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing_tolerates_missing_fields() {
        let raw = r#"{"id": "x", "results": [
            {"title": "Gutenberg", "url": "https://example.org/g", "snippet": "Movable type", "date": "2024-01-01"},
            {"url": "https://example.org/h"}
        ]}"#;
        let response: SearchResponse = serde_json::from_str(raw).unwrap();
        let hits: Vec<SearchHit> = response.results.into_iter().map(SearchHit::from).collect();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Gutenberg");
        assert!(hits[1].title.is_empty());
    }

    #[test]
    fn test_request_body() {
        let request = SearchRequest {
            query: "printing press",
            max_results: 5,
            max_tokens_per_page: 1024,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["query"], "printing press");
        assert_eq!(value["max_results"], 5);
        assert_eq!(value["max_tokens_per_page"], 1024);
    }
}
