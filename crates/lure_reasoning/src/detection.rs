//! Scam detection: weighted rule score, with LLM adjudication for the
//! ambiguous middle band.

use crate::api_types::Message as LlmMessage;
use crate::error::StageError;
use crate::llm::{CompletionParams, LlmClient};
use crate::prompts;
use crate::stage::ResilientStage;
use crate::structured::parse_structured;
use async_trait::async_trait;
use lure_core::patterns::{
    self, contains_any, PhonePolicy, REWARD_TERMS, SENSITIVE_TERMS, THREAT_TERMS, URGENCY_TERMS,
};
use lure_core::Message;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Scores at or above this are scams without asking the model.
pub const SCAM_THRESHOLD: f32 = 0.7;
/// Scores below this are benign without asking the model.
pub const BENIGN_THRESHOLD: f32 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub is_scam: bool,
    pub confidence: f32,
    pub reason: String,
    pub evidence: Vec<String>,
}

/// Weighted indicators present in `text`, capped at 1.0.
pub fn rule_score(text: &str, policy: &PhonePolicy) -> (f32, Vec<String>) {
    let mut score = 0.0f32;
    let mut evidence = Vec::new();
    let mut hit = |weight: f32, what: &str| {
        score += weight;
        evidence.push(what.to_string());
    };

    if contains_any(text, URGENCY_TERMS) {
        hit(0.2, "urgency language");
    }
    if contains_any(text, THREAT_TERMS) {
        hit(0.25, "threatening language");
    }
    if contains_any(text, SENSITIVE_TERMS) {
        hit(0.3, "request for sensitive information");
    }
    if !patterns::url_candidates(text).is_empty() {
        hit(0.2, "contains a link");
    }
    if !patterns::payment_id_candidates(text).is_empty() {
        hit(0.2, "contains a payment ID");
    }
    if !policy.find_all(text).is_empty() {
        hit(0.1, "contains a phone number");
    }
    if contains_any(text, REWARD_TERMS) {
        hit(0.25, "reward or lottery bait");
    }

    (score.min(1.0), evidence)
}

#[derive(Debug, Deserialize)]
struct AdjudicationResponse {
    is_scam: bool,
    confidence: f32,
    reason: String,
}

pub struct AdjudicationInput<'a> {
    pub message: &'a Message,
    pub recent: &'a [Message],
    pub score: f32,
    pub evidence: &'a [String],
}

pub struct ScamDetector {
    client: Option<Arc<dyn LlmClient>>,
    policy: PhonePolicy,
    params: CompletionParams,
}

impl ScamDetector {
    pub fn new(client: Option<Arc<dyn LlmClient>>, policy: PhonePolicy) -> Self {
        Self {
            client,
            policy,
            params: CompletionParams::new(150, 0.1),
        }
    }

    /// Classify `message`; `recent` is context for the ambiguous case.
    pub async fn detect(&self, message: &Message, recent: &[Message]) -> Detection {
        let (score, evidence) = rule_score(&message.text, &self.policy);

        let detection = if score >= SCAM_THRESHOLD {
            Detection {
                is_scam: true,
                confidence: score,
                reason: format!("Rule-based: {}", evidence.join(", ")),
                evidence,
            }
        } else if score < BENIGN_THRESHOLD {
            Detection {
                is_scam: false,
                confidence: score,
                reason: "No significant scam indicators".to_string(),
                evidence,
            }
        } else {
            self.run(&AdjudicationInput {
                message,
                recent,
                score,
                evidence: &evidence,
            })
            .await
        };

        tracing::info!(
            "Detection: is_scam={} confidence={:.2} ({})",
            detection.is_scam,
            detection.confidence,
            detection.reason
        );
        detection
    }
}

#[async_trait]
impl<'a> ResilientStage<AdjudicationInput<'a>> for ScamDetector {
    type Output = Detection;

    fn name(&self) -> &'static str {
        "detection"
    }

    async fn attempt_primary(
        &self,
        input: &AdjudicationInput<'a>,
    ) -> Result<Detection, StageError> {
        let client = self.client.as_ref().ok_or(StageError::Unavailable)?;
        let prompt = prompts::adjudication_prompt(
            &input.message.text,
            input.recent,
            input.score,
            input.evidence,
        );
        let response = client
            .complete(
                prompts::DETECTION_SYSTEM_PROMPT,
                vec![LlmMessage::user(prompt)],
                self.params.clone(),
            )
            .await?;

        let parsed: AdjudicationResponse = parse_structured(&response.text())?;
        if !parsed.confidence.is_finite() || !(0.0..=1.0).contains(&parsed.confidence) {
            return Err(StageError::parse(format!(
                "confidence out of range: {}",
                parsed.confidence
            )));
        }
        let reason = parsed.reason.trim();
        Ok(Detection {
            is_scam: parsed.is_scam,
            confidence: parsed.confidence,
            reason: if reason.is_empty() {
                "LLM adjudication".to_string()
            } else {
                reason.to_string()
            },
            evidence: input.evidence.to_vec(),
        })
    }

    fn fallback(&self, input: &AdjudicationInput<'a>) -> Detection {
        let is_scam = input.score >= 0.5;
        let reason = if input.evidence.is_empty() {
            "Rule-based (ambiguous)".to_string()
        } else {
            format!("Rule-based (ambiguous): {}", input.evidence.join(", "))
        };
        Detection {
            is_scam,
            confidence: input.score,
            reason,
            evidence: input.evidence.to_vec(),
        }
    }
}
