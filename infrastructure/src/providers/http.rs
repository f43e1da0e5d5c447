//! Shared JSON-over-HTTP plumbing.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use storytime_application::ports::content_provider::ProviderError;
use storytime_application::ports::llm_gateway::GatewayError;
use thiserror::Error;
use tracing::debug;

/// Transport-level failure, mapped into each port's own error type.
#[derive(Error, Debug)]
pub(crate) enum HttpFailure {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("{0}")]
    Request(String),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for HttpFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            HttpFailure::Connect(e.to_string())
        } else if e.is_decode() {
            HttpFailure::Decode(e.to_string())
        } else {
            HttpFailure::Request(e.to_string())
        }
    }
}

impl From<HttpFailure> for GatewayError {
    fn from(e: HttpFailure) -> Self {
        match e {
            HttpFailure::Connect(m) => GatewayError::ConnectionError(m),
            HttpFailure::Request(m) => GatewayError::RequestFailed(m),
            HttpFailure::Status { status, body } => GatewayError::Status { status, body },
            HttpFailure::Decode(m) => GatewayError::InvalidResponse(m),
        }
    }
}

impl From<HttpFailure> for ProviderError {
    fn from(e: HttpFailure) -> Self {
        match e {
            HttpFailure::Connect(m) | HttpFailure::Request(m) => ProviderError::Request(m),
            HttpFailure::Status { status, body } => ProviderError::Status { status, body },
            HttpFailure::Decode(m) => ProviderError::InvalidResponse(m),
        }
    }
}

/// Bearer-authenticated JSON client rooted at one base URL.
#[derive(Clone)]
pub(crate) struct JsonClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl JsonClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn headers(&self) -> Result<HeaderMap, HttpFailure> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| HttpFailure::Request(format!("invalid API key header: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, HttpFailure>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| HttpFailure::Decode(e.to_string()))
    }
}
