// OpenAI-compatible chat completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::TranslateConfig;
use crate::error::{Result, ReviewError};
use super::{ChatClient, ChatRequest};

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions client. Requests carry no timeout and are never retried.
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
}

impl OpenAiClient {
    pub fn new(config: &TranslateConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: config.endpoint.clone(),
        }
    }
}

#[async_trait]
impl ChatClient for OpenAiClient {
    async fn complete(&self, request: &ChatRequest, api_key: &str) -> Result<String> {
        debug!("Sending translation request to: {}", self.endpoint);

        let response = self.client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ReviewError::Translation(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ReviewError::Translation(format!(
                "Chat API error {}: {}", status, error_text
            )));
        }

        let completion: CompletionResponse = response.json().await
            .map_err(|e| ReviewError::Translation(format!("Failed to parse response: {}", e)))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ReviewError::Translation("Response contained no message".to_string()))?;

        debug!("Raw model reply: {}", content);
        Ok(content)
    }
}
