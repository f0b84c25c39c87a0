//! Mock LLM Provider: scripted responses for testing without API keys.

use crate::api_types::{Message, MessagesResponse};
use crate::llm::{CompletionParams, LlmClient};
use anyhow::Result;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug)]
enum Scripted {
    Text(String),
    Fail(String),
}

/// Replays queued responses in order; once the queue is empty it either
/// fails every call (`failing`) or acknowledges the prompt.
#[derive(Debug)]
pub struct MockProvider {
    model: String,
    queue: Mutex<VecDeque<Scripted>>,
    fail_when_empty: bool,
}

impl MockProvider {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            queue: Mutex::new(VecDeque::new()),
            fail_when_empty: false,
        }
    }

    /// A provider whose every call fails, as if the service were down.
    pub fn failing() -> Self {
        Self {
            fail_when_empty: true,
            ..Self::new("failing")
        }
    }

    /// A provider that answers with `responses` in order.
    pub fn scripted<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new("scripted");
        for r in responses {
            provider.push_text(r);
        }
        provider
    }

    pub fn push_text(&self, text: impl Into<String>) {
        if let Ok(mut q) = self.queue.lock() {
            q.push_back(Scripted::Text(text.into()));
        }
    }

    pub fn push_failure(&self, reason: impl Into<String>) {
        if let Ok(mut q) = self.queue.lock() {
            q.push_back(Scripted::Fail(reason.into()));
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl LlmClient for MockProvider {
    async fn complete(
        &self,
        _system: &str,
        _messages: Vec<Message>,
        _params: CompletionParams,
    ) -> Result<MessagesResponse> {
        let next = self
            .queue
            .lock()
            .map_err(|_| anyhow::anyhow!("mock queue poisoned"))?
            .pop_front();
        match next {
            Some(Scripted::Text(text)) => Ok(MessagesResponse::from_text(text)),
            Some(Scripted::Fail(reason)) => anyhow::bail!("{}", reason),
            None if self.fail_when_empty => anyhow::bail!("mock provider unavailable"),
            None => Ok(MessagesResponse::from_text(format!(
                "(Mock {} Response) I received your prompt.",
                self.model
            ))),
        }
    }
}
