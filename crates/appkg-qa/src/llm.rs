//! OpenAI-compatible chat completion client.
//!
//! Sends one system and one user message to `{base_url}/chat/completions` and
//! returns the first choice's content.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::QaError;
use crate::parser::TextGenerator;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.siliconflow.cn/v1";

/// Default chat model.
pub const DEFAULT_MODEL: &str = "Qwen/Qwen3-VL-32B-Instruct";

/// Language model settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            timeout_secs: 60,
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Chat completion client.
#[derive(Clone)]
pub struct ChatClient {
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build HTTP client, continuing without a request timeout");
                reqwest::Client::default()
            });

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            client,
        }
    }
}

#[async_trait]
impl TextGenerator for ChatClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String, QaError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(QaError::Generation(format!("API error ({}): {}", status, body)));
        }

        let result: ChatResponse = response.json().await?;
        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| QaError::Generation("response has no message content".to_string()))?;

        debug!(model = %self.model, chars = content.len(), "Generated reply");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config: LlmConfig = serde_json::from_str(r#"{"api_key": "sk-test"}"#).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, 0.0);
        assert!(!format!("{:?}", config).contains("sk-test"));
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            temperature: 0.0,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["model"], "m");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices": [{"index": 0, "message": {"role": "assistant", "content": "MATCH (n) RETURN n"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("MATCH (n) RETURN n"));
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let client = ChatClient::new(&LlmConfig {
            base_url: "http://localhost:8000/v1/".into(),
            ..LlmConfig::default()
        });
        assert_eq!(client.base_url, "http://localhost:8000/v1");
    }

    #[test]
    fn test_client_carries_config() {
        let client = ChatClient::new(&LlmConfig {
            model: "Qwen/Qwen2.5-72B-Instruct".into(),
            temperature: 0.3,
            timeout_secs: 5,
            ..LlmConfig::default()
        });
        assert_eq!(client.model, "Qwen/Qwen2.5-72B-Instruct");
        assert_eq!(client.temperature, 0.3);
    }
}
