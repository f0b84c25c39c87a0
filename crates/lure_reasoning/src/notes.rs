//! Agent notes: one short analyst note per engaged turn.

use crate::api_types::Message as LlmMessage;
use crate::error::StageError;
use crate::llm::{CompletionParams, LlmClient};
use crate::prompts;
use crate::stage::ResilientStage;
use crate::structured::strip_wrapping_quotes;
use async_trait::async_trait;
use lure_core::SessionState;
use std::sync::Arc;

const DEFAULT_DETECTION_REASON: &str = "Scam detected";

pub struct NotesStage {
    client: Option<Arc<dyn LlmClient>>,
    window: usize,
    params: CompletionParams,
}

impl NotesStage {
    pub fn new(client: Option<Arc<dyn LlmClient>>, window: usize) -> Self {
        Self {
            client,
            window,
            params: CompletionParams::new(200, 0.3),
        }
    }

    pub async fn summarize(&self, session: &SessionState) -> String {
        self.run(session).await
    }
}

/// Count template used when no model summary is available.
pub fn template_note(session: &SessionState) -> String {
    let counts = session.artifacts().counts();
    let head = match session.final_decision_reason() {
        Some(reason) => format!("Scam detected: {}", reason),
        None => "Scam suspected".to_string(),
    };
    format!(
        "{}; bank accounts: {}; phone numbers: {}; payment IDs: {}; links: {}; suspicious terms: {}",
        head,
        counts.bank_accounts,
        counts.phone_numbers,
        counts.payment_ids,
        counts.links,
        counts.suspicious_terms
    )
}

#[async_trait]
impl ResilientStage<SessionState> for NotesStage {
    type Output = String;

    fn name(&self) -> &'static str {
        "notes"
    }

    async fn attempt_primary(&self, session: &SessionState) -> Result<String, StageError> {
        let client = self.client.as_ref().ok_or(StageError::Unavailable)?;
        let prompt = prompts::notes_prompt(
            session.recent(self.window),
            &session.artifacts().counts(),
            session.final_decision_reason().unwrap_or(DEFAULT_DETECTION_REASON),
            session.scam_confidence(),
        );
        let response = client
            .complete(
                prompts::NOTES_SYSTEM_PROMPT,
                vec![LlmMessage::user(prompt)],
                self.params.clone(),
            )
            .await?;

        let note = strip_wrapping_quotes(&response.text());
        if note.is_empty() {
            return Err(StageError::Empty);
        }
        Ok(note)
    }

    fn fallback(&self, session: &SessionState) -> String {
        template_note(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;
    use lure_core::{ArtifactSet, Message, PhonePolicy};

    fn session() -> SessionState {
        let mut s = SessionState::new("n");
        s.push_message(Message::counterparty("send otp to 9876543210"));
        let mut set = ArtifactSet::new();
        set.add_phone("9876543210", &PhonePolicy::default());
        set.add_term("otp");
        set.add_link("http://x.example");
        s.merge_artifacts(&set);
        s
    }

    #[test]
    fn test_template_with_and_without_reason() {
        let mut s = session();
        assert_eq!(
            template_note(&s),
            concat!(
                "Scam suspected; bank accounts: 0; phone numbers: 1; payment IDs: 0; ",
                "links: 1; suspicious terms: 1"
            )
        );
        s.record_detection(true, 0.9, "OTP request");
        assert!(template_note(&s).starts_with("Scam detected: OTP request; bank accounts: 0"));
    }

    #[tokio::test]
    async fn test_llm_note_is_unquoted() {
        let stage = NotesStage::new(
            Some(Arc::new(MockProvider::scripted(["\"Classic OTP phishing with urgency.\""]))),
            10,
        );
        assert_eq!(stage.summarize(&session()).await, "Classic OTP phishing with urgency.");
    }

    #[tokio::test]
    async fn test_empty_note_falls_back() {
        let stage = NotesStage::new(Some(Arc::new(MockProvider::scripted(["  "]))), 10);
        assert!(stage.summarize(&session()).await.starts_with("Scam suspected;"));
    }
}
