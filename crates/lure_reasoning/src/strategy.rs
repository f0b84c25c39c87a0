//! Strategy stage: decide whether to keep engaging and which goal to pursue.
//!
//! The LLM only answers one question (is the counterparty ending the
//! conversation?). Goal selection itself is a deterministic rule table shared by
//! the primary and fallback paths.

use crate::api_types::Message as LlmMessage;
use crate::error::StageError;
use crate::llm::{CompletionParams, LlmClient};
use crate::prompts;
use crate::stage::ResilientStage;
use async_trait::async_trait;
use lure_core::patterns::{contains_any, THREAT_TERMS, TIME_PRESSURE_TERMS, URGENCY_TERMS};
use lure_core::{ConversationGoal, Message, SessionState, StrategyDecision};
use std::sync::Arc;

/// Words that mean the counterparty still wants something.
pub const ACTIVE_SCAM_KEYWORDS: &[&str] = &[
    "verify", "blocked", "suspended", "share", "send", "provide", "click", "link", "upi",
    "otp", "pay", "account", "urgent", "immediately", "now", "asap", "required", "must",
    "need to",
];

pub const CLOSING_PHRASES: &[&str] = &[
    "bye", "goodbye", "thank you", "thanks", "that's all", "no need",
];

const REQUEST_TERMS: &[&str] = &[
    "upi", "otp", "link", "click", "verify", "account number", "pin", "cvv", "password", "kyc",
];

/// Answer of the end-detection prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndSignal {
    Ending,
    Continuing,
}

impl EndSignal {
    /// Strict parse: exactly `YES` or `NO` after trimming.
    pub fn parse(text: &str) -> Result<Self, StageError> {
        match text.trim() {
            "YES" => Ok(EndSignal::Ending),
            "NO" => Ok(EndSignal::Continuing),
            "" => Err(StageError::Empty),
            other => Err(StageError::parse(format!(
                "expected YES or NO, got '{}'",
                other.chars().take(40).collect::<String>()
            ))),
        }
    }
}

pub fn has_active_scam_keyword(text: &str) -> bool {
    contains_any(text, ACTIVE_SCAM_KEYWORDS)
}

/// Deterministic goal table. First matching rule wins.
pub fn select_goal(text: &str, message_count: usize, max_messages: usize) -> StrategyDecision {
    if message_count >= max_messages {
        return StrategyDecision::engage(
            ConversationGoal::WrapUp,
            format!("message limit reached ({}/{})", message_count, max_messages),
        );
    }
    if contains_any(text, THREAT_TERMS) {
        return StrategyDecision::engage(ConversationGoal::Escalate, "counterparty is threatening");
    }
    if contains_any(text, URGENCY_TERMS) || contains_any(text, TIME_PRESSURE_TERMS) {
        return StrategyDecision::engage(
            ConversationGoal::Delay,
            "counterparty is applying urgency",
        );
    }
    if contains_any(text, REQUEST_TERMS) {
        return StrategyDecision::engage(
            ConversationGoal::Clarify,
            "counterparty is requesting sensitive action",
        );
    }
    if message_count <= 2 {
        return StrategyDecision::engage(ConversationGoal::Clarify, "early in the conversation");
    }
    StrategyDecision::default_continue()
}

pub struct StrategyInput<'a> {
    pub session: &'a SessionState,
    pub message: &'a Message,
}

pub struct StrategyStage {
    client: Option<Arc<dyn LlmClient>>,
    max_messages: usize,
    params: CompletionParams,
}

impl StrategyStage {
    pub fn new(client: Option<Arc<dyn LlmClient>>, max_messages: usize) -> Self {
        Self {
            client,
            max_messages,
            params: CompletionParams::new(10, 0.0),
        }
    }

    pub async fn decide(&self, session: &SessionState, message: &Message) -> StrategyDecision {
        self.run(&StrategyInput { session, message }).await
    }

    fn select(&self, input: &StrategyInput<'_>) -> StrategyDecision {
        select_goal(&input.message.text, input.session.message_count(), self.max_messages)
    }
}

#[async_trait]
impl<'a> ResilientStage<StrategyInput<'a>> for StrategyStage {
    type Output = StrategyDecision;

    fn name(&self) -> &'static str {
        "strategy"
    }

    async fn attempt_primary(
        &self,
        input: &StrategyInput<'a>,
    ) -> Result<StrategyDecision, StageError> {
        let client = self.client.as_ref().ok_or(StageError::Unavailable)?;
        let counts = input.session.artifacts().counts();
        let prompt = prompts::end_detection_prompt(
            &input.message.text,
            input.session.message_count(),
            counts.payment_ids,
            counts.links,
        );
        let response = client
            .complete(
                prompts::STRATEGY_SYSTEM_PROMPT,
                vec![LlmMessage::user(prompt)],
                self.params.clone(),
            )
            .await?;

        let decision = match EndSignal::parse(&response.text())? {
            EndSignal::Ending if !has_active_scam_keyword(&input.message.text) => {
                StrategyDecision::end("counterparty is ending the conversation")
            }
            EndSignal::Ending => {
                tracing::info!(
                    "End signal overridden: message still contains an active scam keyword"
                );
                self.select(input)
            }
            EndSignal::Continuing => self.select(input),
        };
        tracing::info!("Strategy: {} (engage={})", decision.goal, decision.should_engage);
        Ok(decision)
    }

    fn fallback(&self, input: &StrategyInput<'a>) -> StrategyDecision {
        let text = &input.message.text;
        let decision = if contains_any(text, CLOSING_PHRASES) && !has_active_scam_keyword(text) {
            StrategyDecision::end("closing phrase without active request")
        } else {
            self.select(input)
        };
        tracing::info!("Strategy (rules): {} (engage={})", decision.goal, decision.should_engage);
        decision
    }
}
