//! Artifact extraction: LLM pass over the whole conversation, with the pattern
//! library as a total fallback.
//!
//! Failures never escape `extract`. A missing client, a failed call, malformed
//! output or an empty result all fall through to the local matchers.

use crate::api_types::Message as LlmMessage;
use crate::error::StageError;
use crate::llm::{CompletionParams, LlmClient};
use crate::prompts;
use crate::stage::ResilientStage;
use crate::structured::parse_structured;
use async_trait::async_trait;
use lure_core::patterns::{self, strip_separators, PhonePolicy};
use lure_core::{ArtifactSet, Message};
use serde::Deserialize;
use std::sync::Arc;

/// Structured response of the extraction prompt. Every field is optional but
/// must be an array of strings when present.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ExtractionResponse {
    bank_accounts: Vec<String>,
    phone_numbers: Vec<String>,
    upi_ids: Vec<String>,
    phishing_links: Vec<String>,
    suspicious_keywords: Vec<String>,
}

pub struct ExtractionInput<'a> {
    pub message: &'a Message,
    pub history: &'a [Message],
}

pub struct ExtractionEngine {
    client: Option<Arc<dyn LlmClient>>,
    policy: PhonePolicy,
    params: CompletionParams,
}

impl ExtractionEngine {
    pub fn new(client: Option<Arc<dyn LlmClient>>, policy: PhonePolicy) -> Self {
        Self {
            client,
            policy,
            // Low temperature for structured output
            params: CompletionParams::new(800, 0.1),
        }
    }

    /// Extract artifacts from `message` and everything in `history`.
    pub async fn extract(&self, message: &Message, history: &[Message]) -> ArtifactSet {
        self.run(&ExtractionInput { message, history }).await
    }

    /// Pattern-library pass over the current message and every history message.
    pub fn extract_local(&self, message: &Message, history: &[Message]) -> ArtifactSet {
        let mut set = ArtifactSet::new();
        for msg in history.iter().chain(std::iter::once(message)) {
            self.scan_text(&msg.text, &mut set);
        }
        set
    }

    fn scan_text(&self, text: &str, set: &mut ArtifactSet) {
        for account in patterns::bank_account_candidates(text) {
            set.add_bank_account(&account);
        }
        for phone in self.policy.find_all(text) {
            set.phone_numbers.insert(phone);
        }
        for id in patterns::payment_id_candidates(text) {
            set.add_payment_id(&id);
        }
        for link in patterns::url_candidates(text) {
            set.add_link(&link);
        }
        for term in patterns::suspicious_terms(text) {
            set.add_term(&term);
        }
    }

    /// A number with an explicit foreign country code, kept as written.
    /// Malformed numbers under the local code are dropped.
    fn foreign_phone(&self, raw: &str) -> Option<String> {
        let cleaned = strip_separators(raw);
        let digits = cleaned.strip_prefix('+')?;
        let local = digits.starts_with(self.policy.country_code.as_str());
        (!local && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
            .then_some(cleaned)
    }

    fn normalize_response(&self, resp: ExtractionResponse) -> ArtifactSet {
        let mut set = ArtifactSet::new();
        for account in &resp.bank_accounts {
            set.add_bank_account(account);
        }
        for phone in &resp.phone_numbers {
            if !set.add_phone(phone, &self.policy) {
                if let Some(foreign) = self.foreign_phone(phone) {
                    set.phone_numbers.insert(foreign);
                }
            }
        }
        for id in &resp.upi_ids {
            set.add_payment_id(id);
        }
        for link in &resp.phishing_links {
            set.add_link(link);
        }
        for term in &resp.suspicious_keywords {
            set.add_term(term);
        }
        set
    }
}

#[async_trait]
impl<'a> ResilientStage<ExtractionInput<'a>> for ExtractionEngine {
    type Output = ArtifactSet;

    fn name(&self) -> &'static str {
        "extraction"
    }

    async fn attempt_primary(
        &self,
        input: &ExtractionInput<'a>,
    ) -> Result<ArtifactSet, StageError> {
        let client = self.client.as_ref().ok_or(StageError::Unavailable)?;
        let prompt = prompts::extraction_prompt(input.history, input.message);
        let response = client
            .complete(
                prompts::EXTRACTION_SYSTEM_PROMPT,
                vec![LlmMessage::user(prompt)],
                self.params.clone(),
            )
            .await?;

        let text = response.text();
        tracing::debug!("Extraction response: {:.200}", text);
        let parsed: ExtractionResponse = parse_structured(&text)?;
        let set = self.normalize_response(parsed);
        if set.is_empty() {
            return Err(StageError::Empty);
        }
        tracing::info!("Extracted {} artifacts via LLM", set.len());
        Ok(set)
    }

    fn fallback(&self, input: &ExtractionInput<'a>) -> ArtifactSet {
        let set = self.extract_local(input.message, input.history);
        tracing::info!("Extracted {} artifacts via patterns", set.len());
        set
    }
}
