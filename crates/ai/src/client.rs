//! Chat completion client for a local OpenAI-compatible LLM runtime.

use std::time::Duration;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

/// System message sent with every prompt.
pub const SYSTEM_PROMPT: &str = "Be precise in your answers and follow the given instructions.";

/// Connection settings for the LLM runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Server URL, without the `/v1` suffix
    pub base_url: String,

    /// Model name
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion token limit; `None` lets the server decide
    pub max_tokens: Option<i64>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            model: "deepseek-r1-distill-qwen-7b".to_string(),
            temperature: 0.7,
            max_tokens: None,
            timeout_secs: 300,
        }
    }
}

/// Result of probing the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiStatus {
    /// Whether the models endpoint answered successfully
    pub reachable: bool,

    /// Model ids the runtime advertises
    pub models: Vec<String>,

    /// Whether the configured model is among them
    pub model_available: bool,
}

/// A language model that answers review prompts.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a prompt and return the assistant's reply.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Check whether the runtime is reachable.
    async fn health_check(&self) -> Result<ApiStatus>;
}

/// Client for `/v1/chat/completions` style servers.
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: Client,
    config: LlmConfig,
}

impl ChatCompletionClient {
    /// Create a new client.
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    /// Settings in use.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Request body for a prompt.
    pub fn request_body(&self, prompt: &str) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "temperature": self.config.temperature,
            "stream": false
        });
        if let Some(max_tokens) = self.config.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }
}

#[async_trait]
impl LlmClient for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        debug!("Sending prompt ({} chars) to {}", prompt.len(), self.config.model);

        let response = self
            .client
            .post(self.url("chat/completions"))
            .json(&self.request_body(prompt))
            .send()
            .await
            .context("Failed to call chat completions API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("LLM API error (status {}): {}", status, error_text);
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse chat completions response")?;

        let content = assistant_message(&body)
            .context("No valid response from assistant")?;
        info!("Received response from LLM ({} chars)", content.len());
        Ok(content)
    }

    async fn health_check(&self) -> Result<ApiStatus> {
        let response = match self.client.get(self.url("models")).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("LLM runtime unreachable: {}", e);
                return Ok(ApiStatus {
                    reachable: false,
                    models: Vec::new(),
                    model_available: false,
                });
            }
        };

        if !response.status().is_success() {
            return Ok(ApiStatus {
                reachable: false,
                models: Vec::new(),
                model_available: false,
            });
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse models response")?;
        let models = model_ids(&body);
        let model_available = models.iter().any(|m| m == &self.config.model);

        Ok(ApiStatus {
            reachable: true,
            models,
            model_available,
        })
    }
}

/// `choices[0].message.content` of a chat completion.
fn assistant_message(body: &Value) -> Option<String> {
    body.get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

/// `data[*].id` of a models listing.
fn model_ids(body: &Value) -> Vec<String> {
    body.get("data")
        .and_then(Value::as_array)
        .map(|models| {
            models
                .iter()
                .filter_map(|m| m.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let client = ChatCompletionClient::new(LlmConfig::default()).unwrap();
        let body = client.request_body("Review this");
        assert_eq!(body["model"], "deepseek-r1-distill-qwen-7b");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "Review this");
        assert_eq!(body["stream"], false);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_request_body_with_max_tokens() {
        let client = ChatCompletionClient::new(LlmConfig {
            max_tokens: Some(2048),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.request_body("x")["max_tokens"], 2048);
    }

    #[test]
    fn test_url_joins_cleanly() {
        let client = ChatCompletionClient::new(LlmConfig {
            base_url: "http://localhost:1234/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.url("models"), "http://localhost:1234/v1/models");
    }

    #[test]
    fn test_assistant_message() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "QE1: ok"}}]});
        assert_eq!(assistant_message(&body).as_deref(), Some("QE1: ok"));
        assert_eq!(assistant_message(&json!({"choices": []})), None);
    }

    #[test]
    fn test_model_ids() {
        let body = json!({"object": "list", "data": [{"id": "a"}, {"id": "b"}, {"name": "c"}]});
        assert_eq!(model_ids(&body), vec!["a", "b"]);
        assert!(model_ids(&json!({})).is_empty());
    }
}
