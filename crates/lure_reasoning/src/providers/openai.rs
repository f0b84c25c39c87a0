//! OpenAI-compatible chat completions client (OpenAI, Groq, DeepSeek, Ollama).

use crate::api_types::{ContentBlock, Message, MessagesResponse, Role};
use crate::llm::{CompletionParams, LlmClient};
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Default endpoint for a known provider, unless `override_url` is given.
pub fn resolve_base_url(provider: &str, override_url: Option<&str>) -> Option<String> {
    if let Some(url) = override_url.map(str::trim).filter(|u| !u.is_empty()) {
        return Some(url.trim_end_matches('/').to_string());
    }
    let url = match provider {
        "groq" => "https://api.groq.com/openai/v1",
        "openai" => "https://api.openai.com/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "ollama" => "http://localhost:11434/v1",
        _ => return None,
    };
    Some(url.to_string())
}

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs.max(1)))
                .build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(
        &self,
        system: &str,
        messages: Vec<Message>,
        params: CompletionParams,
    ) -> Result<MessagesResponse> {
        // System prompt goes first as its own message.
        let mut openai_messages = vec![json!({ "role": "system", "content": system })];
        for msg in &messages {
            let role = match msg.role {
                Role::User => "user",
            };
            openai_messages.push(json!({ "role": role, "content": msg.text() }));
        }

        let payload = json!({
            "model": self.model,
            "messages": openai_messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });

        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self.client.post(&url).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request
            .send()
            .await
            .context("Failed to send chat completion request")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Chat completion API error ({}): {}", status, error_text);
        }

        let resp_json: Value = response
            .json()
            .await
            .context("Failed to decode chat completion response")?;
        let choice = &resp_json["choices"][0];
        let text = choice["message"]["content"]
            .as_str()
            .context("Chat completion response has no message content")?;
        let finish_reason = choice["finish_reason"].as_str().map(|s| s.to_string());

        tracing::debug!(
            "Chat completion finished: reason={:?}, {} chars",
            finish_reason,
            text.len()
        );

        Ok(MessagesResponse {
            content: vec![ContentBlock::Text {
                text: text.to_string(),
            }],
            stop_reason: finish_reason,
        })
    }
}
