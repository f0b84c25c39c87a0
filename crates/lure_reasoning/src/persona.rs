//! Response generation in the persona's voice.
//!
//! The primary path asks the LLM for a reply under the persona system prompt and
//! the goal instruction. An empty generation is a decision to stay silent, not a
//! failure. Without the LLM a fixed template is picked by goal and keyword.

use crate::api_types::Message as LlmMessage;
use crate::error::StageError;
use crate::llm::{CompletionParams, LlmClient};
use crate::prompts;
use crate::stage::ResilientStage;
use crate::structured::strip_wrapping_quotes;
use async_trait::async_trait;
use lure_core::patterns::contains_any;
use lure_core::{ConversationGoal, Message};
use std::sync::Arc;

const SPEAKER_PREFIXES: &[&str] = &["subject:", "you:"];

pub struct PersonaInput<'a> {
    pub message: &'a Message,
    /// Prior messages, current one excluded.
    pub history: &'a [Message],
    pub goal: ConversationGoal,
}

pub struct PersonaStage {
    client: Option<Arc<dyn LlmClient>>,
    params: CompletionParams,
}

impl PersonaStage {
    pub fn new(client: Option<Arc<dyn LlmClient>>, params: CompletionParams) -> Self {
        Self { client, params }
    }

    /// Candidate reply, or `None` when the model chose to say nothing.
    pub async fn respond(
        &self,
        message: &Message,
        history: &[Message],
        goal: ConversationGoal,
    ) -> Option<String> {
        self.run(&PersonaInput {
            message,
            history,
            goal,
        })
        .await
    }
}

/// Trim whitespace, wrapping quotes and a leading speaker label.
pub fn clean_reply(raw: &str) -> String {
    let mut text = strip_wrapping_quotes(raw);
    let lower = text.to_lowercase();
    if let Some(prefix) = SPEAKER_PREFIXES.iter().find(|p| lower.starts_with(**p)) {
        if let Some(rest) = text.get(prefix.len()..) {
            text = strip_wrapping_quotes(rest);
        }
    }
    text
}

/// Keyword-selected template for `goal`.
pub fn template_reply(goal: ConversationGoal, text: &str) -> &'static str {
    match goal {
        ConversationGoal::Clarify => {
            if contains_any(text, &["otp", "pin", "password", "cvv"]) {
                "Why would the bank need that code? I was told never to share it."
            } else if contains_any(text, &["upi", "upi id"]) {
                "What is this UPI thing for? I don't really understand how it works."
            } else if contains_any(text, &["link", "click"]) {
                "I'm not comfortable opening links. Can you explain what this is about?"
            } else if contains_any(text, &["account", "verify", "kyc"]) {
                "Which account do you mean? I have not received any letter from my bank."
            } else {
                "Sorry, I don't understand. Can you explain it again?"
            }
        }
        ConversationGoal::Delay => {
            if contains_any(text, &["minutes", "today", "now", "immediately"]) {
                "I'm outside right now. Can this wait until I get home?"
            } else {
                "Please give me some time, I need to check this first."
            }
        }
        ConversationGoal::Escalate => {
            if contains_any(text, &["legal action", "arrest", "police"]) {
                "Legal action? I haven't done anything wrong. What is going on?"
            } else if contains_any(text, &["blocked", "suspended", "frozen", "locked"]) {
                "Blocked? That is very worrying. What exactly happened to my account?"
            } else {
                "This is making me nervous. What do I need to do?"
            }
        }
        ConversationGoal::Continue => {
            if text.trim_end().ends_with('?') {
                "I'm not sure. Why are you asking me this?"
            } else {
                "Okay. Can you tell me a bit more about this?"
            }
        }
        ConversationGoal::WrapUp => "I'll check with my bank directly. Thank you.",
    }
}

#[async_trait]
impl<'a> ResilientStage<PersonaInput<'a>> for PersonaStage {
    type Output = Option<String>;

    fn name(&self) -> &'static str {
        "persona"
    }

    async fn attempt_primary(
        &self,
        input: &PersonaInput<'a>,
    ) -> Result<Option<String>, StageError> {
        let client = self.client.as_ref().ok_or(StageError::Unavailable)?;
        let system = prompts::persona_system_prompt(input.goal);
        let prompt = prompts::persona_prompt(input.history, &input.message.text);
        let response = client
            .complete(&system, vec![LlmMessage::user(prompt)], self.params.clone())
            .await?;

        let reply = clean_reply(&response.text());
        if reply.is_empty() {
            tracing::info!("Persona declined to reply");
            return Ok(None);
        }
        tracing::debug!("Persona reply for {}: {:.120}", input.goal, reply);
        Ok(Some(reply))
    }

    fn fallback(&self, input: &PersonaInput<'a>) -> Option<String> {
        Some(template_reply(input.goal, &input.message.text).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;
    use lure_core::config::SafetyConfig;
    use lure_core::ResponseGuard;

    const ALL_GOALS: [ConversationGoal; 5] = [
        ConversationGoal::Clarify,
        ConversationGoal::Delay,
        ConversationGoal::Escalate,
        ConversationGoal::Continue,
        ConversationGoal::WrapUp,
    ];

    #[test]
    fn test_clean_reply() {
        assert_eq!(clean_reply("  \"Why is that?\"  "), "Why is that?");
        assert_eq!(clean_reply("You: \"Who is this?\""), "Who is this?");
        assert_eq!(clean_reply("subject: okay"), "okay");
        assert_eq!(clean_reply("\"\""), "");
    }

    #[test]
    fn test_templates_pass_the_gate() {
        let guard = ResponseGuard::new(SafetyConfig::default());
        let inputs = [
            "send otp",
            "share upi id",
            "click link",
            "verify account",
            "in ten minutes",
            "legal action",
            "account blocked",
            "what?",
            "hello",
        ];
        for goal in ALL_GOALS {
            for input in inputs {
                let reply = template_reply(goal, input);
                assert!(guard.check_response(reply).is_ok(), "{} / {}: {}", goal, input, reply);
            }
        }
    }

    #[tokio::test]
    async fn test_empty_generation_declines() {
        let stage = PersonaStage::new(
            Some(Arc::new(MockProvider::scripted(["  \"\"  "]))),
            CompletionParams::default(),
        );
        let reply = stage
            .respond(&Message::counterparty("hi"), &[], ConversationGoal::Continue)
            .await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_failure_uses_template() {
        let stage = PersonaStage::new(
            Some(Arc::new(MockProvider::failing())),
            CompletionParams::default(),
        );
        let reply = stage
            .respond(
                &Message::counterparty("Your account is blocked"),
                &[],
                ConversationGoal::Escalate,
            )
            .await;
        assert_eq!(
            reply.as_deref(),
            Some("Blocked? That is very worrying. What exactly happened to my account?")
        );
    }

    #[tokio::test]
    async fn test_generated_reply_is_cleaned() {
        let stage = PersonaStage::new(
            Some(Arc::new(MockProvider::scripted(["You: \"Which bank is this?\""]))),
            CompletionParams::default(),
        );
        let reply = stage
            .respond(&Message::counterparty("hi"), &[], ConversationGoal::Clarify)
            .await;
        assert_eq!(reply.as_deref(), Some("Which bank is this?"));
    }
}
