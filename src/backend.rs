//! Generative backend invocation.
//!
//! One call per batch: the whole prompt goes out in a single request and the
//! response text comes back unparsed. Uses rstructor's Gemini client.

use crate::config::Config;
use async_trait::async_trait;
use rstructor::{GeminiClient, GeminiModel, LLMClient};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("no generative backend configured: {0}")]
    Unavailable(String),
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("LLM request timed out after {0:?}")]
    Timeout(Duration),
}

/// A generative text service: prompt in, raw text out.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;
}

/// Gemini through rstructor
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiBackend {
    /// Build the backend from config; `Unavailable` when no API key is set.
    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        let api_key = config
            .api_key()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Ok(Self {
            api_key: api_key.to_string(),
            model: config.agent.model.clone(),
            timeout: config.agent.timeout(),
        })
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let client = GeminiClient::new(&self.api_key)
            .map_err(|e| BackendError::RequestFailed(e.to_string()))?
            .model(parse_gemini_model(&self.model));

        info!(model = %self.model, prompt_chars = prompt.len(), "Calling Gemini");
        let result = tokio::time::timeout(self.timeout, client.generate_with_metadata(prompt))
            .await
            .map_err(|_| BackendError::Timeout(self.timeout))?
            .map_err(|e| BackendError::RequestFailed(e.to_string()))?;

        debug!(response_chars = result.text.len(), "Gemini responded");
        Ok(result.text)
    }
}

/// Parse a model string into a GeminiModel
fn parse_gemini_model(model: &str) -> GeminiModel {
    match model {
        "gemini-2.0-flash" => GeminiModel::Gemini20Flash,
        "gemini-2.5-flash" => GeminiModel::Gemini25Flash,
        "gemini-2.5-pro" => GeminiModel::Gemini25Pro,
        _ => GeminiModel::Gemini20Flash, // Default
    }
}
