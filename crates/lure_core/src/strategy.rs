use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversational objective chosen for a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationGoal {
    /// Ask for clarification without agreeing to anything.
    Clarify,
    /// Stall politely.
    Delay,
    /// Show increased concern.
    Escalate,
    /// Keep talking naturally.
    Continue,
    /// Close the conversation.
    WrapUp,
}

impl ConversationGoal {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationGoal::Clarify => "CLARIFY",
            ConversationGoal::Delay => "DELAY",
            ConversationGoal::Escalate => "ESCALATE",
            ConversationGoal::Continue => "CONTINUE",
            ConversationGoal::WrapUp => "WRAP_UP",
        }
    }
}

impl fmt::Display for ConversationGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the strategy stage. Produced fresh every turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDecision {
    pub goal: ConversationGoal,
    pub should_engage: bool,
    pub reasoning: String,
}

impl StrategyDecision {
    pub fn engage(goal: ConversationGoal, reasoning: impl Into<String>) -> Self {
        Self {
            goal,
            should_engage: true,
            reasoning: reasoning.into(),
        }
    }

    /// Stop without replying.
    pub fn end(reasoning: impl Into<String>) -> Self {
        Self {
            goal: ConversationGoal::WrapUp,
            should_engage: false,
            reasoning: reasoning.into(),
        }
    }

    /// The decision every strategy falls back to when nothing else applies.
    pub fn default_continue() -> Self {
        Self::engage(ConversationGoal::Continue, "no rule matched; continuing")
    }

    /// WRAP_UP without engaging: the turn produces no reply.
    pub fn is_silent_end(&self) -> bool {
        self.goal == ConversationGoal::WrapUp && !self.should_engage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_serde() {
        assert_eq!(serde_json::to_string(&ConversationGoal::WrapUp).unwrap(), "\"WRAP_UP\"");
        let g: ConversationGoal = serde_json::from_str("\"CLARIFY\"").unwrap();
        assert_eq!(g, ConversationGoal::Clarify);
    }

    #[test]
    fn test_silent_end() {
        assert!(StrategyDecision::end("bye").is_silent_end());
        assert!(!StrategyDecision::engage(ConversationGoal::WrapUp, "closing").is_silent_end());
        let d = StrategyDecision::default_continue();
        assert_eq!(d.goal, ConversationGoal::Continue);
        assert!(d.should_engage);
    }
}
