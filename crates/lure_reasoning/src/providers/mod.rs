//! Concrete `LlmClient` implementations and the factory that picks one.

pub mod mock;
pub mod openai;

use crate::llm::LlmClient;
use lure_core::config::LlmConfig;
use std::sync::Arc;

/// Build the client named by `config.provider`.
///
/// Returns `None` when no external service is configured, which puts every
/// stage on its local fallback for the lifetime of the process.
pub fn build_client(config: &LlmConfig) -> Option<Arc<dyn LlmClient>> {
    let provider = config.provider.trim().to_lowercase();
    match provider.as_str() {
        "" | "none" | "off" => {
            tracing::warn!("No LLM provider configured; all stages will use local fallbacks");
            None
        }
        "mock" => Some(Arc::new(mock::MockProvider::new(&config.model))),
        name => {
            let Some(base_url) = openai::resolve_base_url(name, config.base_url.as_deref()) else {
                tracing::warn!(
                    "Unknown LLM provider '{}'; all stages will use local fallbacks",
                    name
                );
                return None;
            };
            let api_key = config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string);
            if api_key.is_none() && name != "ollama" {
                tracing::warn!(
                    "No API key for provider '{}'; all stages will use local fallbacks",
                    name
                );
                return None;
            }
            let built =
                openai::OpenAiClient::new(&base_url, api_key, &config.model, config.timeout_secs);
            match built {
                Ok(client) => {
                    tracing::info!("Using LLM provider '{}' with model '{}'", name, config.model);
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::warn!("Failed to build LLM client ({}); using local fallbacks", e);
                    None
                }
            }
        }
    }
}
