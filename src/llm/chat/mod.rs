pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use super::{ LlmConfig, LlmType };
use self::ollama::OllamaClient;
use self::openai::OpenAIChatClient;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model endpoint returned {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },

    #[error("model returned no completion")]
    EmptyResponse,

    #[error("model did not answer within {0:?}")]
    Timeout(Duration),

    #[error("invalid model configuration: {0}")]
    Config(String),
}

#[derive(Deserialize, Debug, Clone)]
pub struct CompletionResponse {
    pub response: String,
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, ModelError>;

    fn get_model(&self) -> String;
    fn get_base_url(&self) -> Option<String>;
}

/// Bounds every completion of the wrapped client by a fixed deadline.
pub struct TimedChatClient {
    inner: Arc<dyn ChatClient>,
    timeout: Duration,
}

impl TimedChatClient {
    pub fn new(inner: Arc<dyn ChatClient>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl ChatClient for TimedChatClient {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, ModelError> {
        match tokio::time::timeout(self.timeout, self.inner.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout(self.timeout)),
        }
    }

    fn get_model(&self) -> String {
        self.inner.get_model()
    }

    fn get_base_url(&self) -> Option<String> {
        self.inner.get_base_url()
    }
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, ModelError> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        LlmType::Ollama => {
            let specific_client = OllamaClient::from_config(config)?;
            Arc::new(specific_client)
        }
        LlmType::OpenAI => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    match config.timeout {
        Some(timeout) => Ok(Arc::new(TimedChatClient::new(client, timeout))),
        None => Ok(client),
    }
}

/// Turns a non-2xx reply into a `ModelError::Status` carrying the body text.
pub(crate) async fn check_status(
    resp: reqwest::Response
) -> Result<reqwest::Response, ModelError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ModelError::Status { status: status.as_u16(), body })
}
