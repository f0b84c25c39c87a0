pub mod artifacts;
pub mod config;
pub mod patterns;
pub mod safety;
pub mod session;
pub mod strategy;

pub use artifacts::{ArtifactCounts, ArtifactSet};
pub use config::LureConfig;
pub use patterns::PhonePolicy;
pub use safety::{ResponseGuard, SafetyViolation};
pub use session::{SessionManager, SessionSnapshot, SessionState};
pub use strategy::{ConversationGoal, StrategyDecision};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// Our persona.
    #[serde(alias = "user")]
    Subject,
    /// The scammer on the other end.
    #[serde(alias = "scammer")]
    Counterparty,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::Subject => "subject",
            Sender::Counterparty => "counterparty",
        }
    }
}

/// A single conversation message. Immutable once appended to a history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    /// Unix timestamp (seconds)
    pub timestamp: i64,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn counterparty(text: impl Into<String>) -> Self {
        Self::new(Sender::Counterparty, text)
    }

    pub fn subject(text: impl Into<String>) -> Self {
        Self::new(Sender::Subject, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_aliases() {
        let s: Sender = serde_json::from_str("\"scammer\"").unwrap();
        assert_eq!(s, Sender::Counterparty);
        let s: Sender = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(s, Sender::Subject);
        assert_eq!(serde_json::to_string(&Sender::Counterparty).unwrap(), "\"counterparty\"");
    }

    #[test]
    fn test_message_constructors() {
        let m = Message::counterparty("hello");
        assert_eq!(m.sender, Sender::Counterparty);
        assert_eq!(m.text, "hello");
        assert!(m.timestamp > 0);
    }
}
