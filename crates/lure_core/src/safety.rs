use crate::config::SafetyConfig;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Reply used whenever the gate vetoes a candidate.
pub const DEFAULT_FALLBACK_REPLY: &str = "I'm not sure how to respond to that. Can you clarify?";

static RE_PAYMENT_INSTRUCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:transfer|send|pay|deposit)\b[^.?!\n]{0,20}?\b(?:money|amount|funds|rupees|inr|rs)\b",
    )
    .unwrap()
});
static RE_NUMERIC_SECRET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{4,}\b").unwrap());

// ============================================================================
// Violation type
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationKind {
    /// Candidate contains a denylisted phrase.
    ForbiddenPhrase,
    /// Candidate tells someone to move money.
    PaymentInstruction,
    /// Candidate discloses a numeric secret (OTP, PIN, account).
    NumericDisclosure,
}

/// A gate veto. Policy outcome, not a failure.
#[derive(Debug, Clone)]
pub struct SafetyViolation {
    pub reason: String,
    pub kind: ViolationKind,
}

impl fmt::Display for SafetyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl std::error::Error for SafetyViolation {}

// ============================================================================
// ResponseGuard
// ============================================================================

pub struct ResponseGuard {
    config: SafetyConfig,
    /// (lowercased, as configured) pairs; blank entries are dropped.
    forbidden: Vec<(String, String)>,
}

impl ResponseGuard {
    pub fn new(config: SafetyConfig) -> Self {
        let forbidden = config
            .forbidden_phrases
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| (p.to_lowercase(), p.clone()))
            .collect();
        Self { config, forbidden }
    }

    /// The fixed reply substituted for vetoed candidates.
    pub fn fallback_reply(&self) -> &str {
        &self.config.fallback_reply
    }

    /// Inspect a candidate reply. The candidate is never repaired.
    pub fn check_response(&self, candidate: &str) -> Result<(), SafetyViolation> {
        let lower = candidate.to_lowercase();

        for (phrase, original) in &self.forbidden {
            if lower.contains(phrase.as_str()) {
                return Err(SafetyViolation {
                    reason: format!("Response contains forbidden phrase: '{}'", original),
                    kind: ViolationKind::ForbiddenPhrase,
                });
            }
        }

        if self.config.block_payment_instructions {
            if let Some(m) = RE_PAYMENT_INSTRUCTION.find(candidate) {
                return Err(SafetyViolation {
                    reason: format!("Response contains a payment instruction: '{}'", m.as_str()),
                    kind: ViolationKind::PaymentInstruction,
                });
            }
        }

        if self.config.block_numeric_disclosure && RE_NUMERIC_SECRET.is_match(candidate) {
            return Err(SafetyViolation {
                reason: "Response discloses a numeric value that may be sensitive".to_string(),
                kind: ViolationKind::NumericDisclosure,
            });
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> ResponseGuard {
        ResponseGuard::new(SafetyConfig::default())
    }

    #[test]
    fn test_clean_reply_passes() {
        assert!(guard()
            .check_response("I'm not sure why this is needed. Can you explain?")
            .is_ok());
    }

    #[test]
    fn test_forbidden_phrase_case_insensitive() {
        let err = guard().check_response("Well, I AM AN AI after all").unwrap_err();
        assert_eq!(err.kind, ViolationKind::ForbiddenPhrase);
        assert!(err.reason.contains("I am an AI"));
    }

    #[test]
    fn test_meta_phrase_blocked() {
        let err = guard().check_response("Our system has logged this chat.").unwrap_err();
        assert_eq!(err.kind, ViolationKind::ForbiddenPhrase);
    }

    #[test]
    fn test_payment_instruction_blocked() {
        let err = guard().check_response("Please transfer the money to my friend").unwrap_err();
        assert_eq!(err.kind, ViolationKind::PaymentInstruction);
    }

    #[test]
    fn test_numeric_disclosure_blocked() {
        let err = guard().check_response("Okay, the code is 4821").unwrap_err();
        assert_eq!(err.kind, ViolationKind::NumericDisclosure);
        // short numbers are fine
        assert!(guard().check_response("Give me 10 minutes please").is_ok());
    }

    #[test]
    fn test_custom_config() {
        let g = ResponseGuard::new(SafetyConfig {
            forbidden_phrases: vec!["banana".into()],
            fallback_reply: "Sorry?".into(),
            block_payment_instructions: false,
            block_numeric_disclosure: false,
        });
        assert!(g.check_response("Send the money, code 123456").is_ok());
        assert!(g.check_response("BANANA").is_err());
        assert_eq!(g.fallback_reply(), "Sorry?");
    }

    #[test]
    fn test_blank_phrase_does_not_shift_reason() {
        let g = ResponseGuard::new(SafetyConfig {
            forbidden_phrases: vec!["  ".into(), "Banana".into()],
            ..SafetyConfig::default()
        });
        let err = g.check_response("I like banana bread").unwrap_err();
        assert_eq!(err.kind, ViolationKind::ForbiddenPhrase);
        assert!(err.reason.contains("'Banana'"), "{}", err.reason);
    }
}
