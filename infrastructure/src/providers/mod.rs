//! HTTP adapters for the LLM, search and image ports.
//!
//! - [`openai`]: chat completions with function tools ([`OpenAiGateway`]) and
//!   image generation ([`OpenAiImageGenerator`])
//! - [`perplexity`]: web search ([`PerplexitySearch`])

pub mod openai;
pub mod perplexity;

mod http;

pub use openai::{OpenAiGateway, OpenAiImageGenerator, OpenAiSession};
pub use perplexity::PerplexitySearch;
