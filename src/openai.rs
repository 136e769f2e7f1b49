//! Shared OpenAI client construction.
//!
//! Every external model call in Svar (embeddings, chat completion, speech
//! recognition) goes through a client built here so a hung provider endpoint
//! cannot block a request forever.

use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Per-request timeout applied to every provider call (2 minutes).
const PROVIDER_TIMEOUT_SECS: u64 = 120;

/// Create an OpenAI client with the standard provider timeout.
pub fn create_client() -> Client<OpenAIConfig> {
    create_client_with_timeout(Duration::from_secs(PROVIDER_TIMEOUT_SECS))
}

/// Create an OpenAI client with a custom per-request timeout.
pub fn create_client_with_timeout(timeout: Duration) -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to create HTTP client");

    Client::with_config(OpenAIConfig::default()).with_http_client(http_client)
}
