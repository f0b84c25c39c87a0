//! Per-message controller: extraction, strategy, response generation, safety
//! gate and notes, always in that order and each at most once.

use crate::extraction::ExtractionEngine;
use crate::llm::{CompletionParams, LlmClient};
use crate::notes::NotesStage;
use crate::persona::PersonaStage;
use crate::strategy::StrategyStage;
use lure_core::{
    ArtifactSet, ConversationGoal, LureConfig, Message, ResponseGuard, SessionState,
    StrategyDecision,
};
use serde::Serialize;
use std::sync::Arc;

/// What one processed message produced, handed back for delivery.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// Reply to send, if any.
    pub reply: Option<String>,
    pub decision: StrategyDecision,
    /// Artifacts extracted this turn (before merging).
    pub artifacts: ArtifactSet,
    pub gate_triggered: bool,
    pub conversation_ended: bool,
}

impl TurnOutcome {
    fn silent(decision: StrategyDecision, artifacts: ArtifactSet, session: &SessionState) -> Self {
        Self {
            reply: None,
            decision,
            artifacts,
            gate_triggered: false,
            conversation_ended: session.conversation_ended(),
        }
    }
}

pub struct Pipeline {
    extraction: ExtractionEngine,
    strategy: StrategyStage,
    persona: PersonaStage,
    notes: NotesStage,
    guard: ResponseGuard,
    persona_window: usize,
}

impl Pipeline {
    pub fn new(client: Option<Arc<dyn LlmClient>>, config: &LureConfig) -> Self {
        let engagement = &config.engagement;
        let persona_params = CompletionParams::new(config.llm.max_tokens, config.llm.temperature);
        Self {
            extraction: ExtractionEngine::new(client.clone(), config.extraction.phone.clone()),
            strategy: StrategyStage::new(client.clone(), engagement.max_messages),
            persona: PersonaStage::new(client.clone(), persona_params),
            notes: NotesStage::new(client, engagement.notes_window),
            guard: ResponseGuard::new(config.safety.clone()),
            persona_window: engagement.persona_window,
        }
    }

    /// Run one turn for an incoming counterparty message.
    ///
    /// The caller must hold the session exclusively for the whole turn.
    pub async fn process_message(
        &self,
        session: &mut SessionState,
        message: Message,
    ) -> TurnOutcome {
        session.begin_turn();

        // 1. Extraction over the message and the full prior history.
        let artifacts = self.extraction.extract(&message, session.history()).await;
        let added = session.merge_artifacts(&artifacts);
        session.push_message(message.clone());
        tracing::debug!(
            "Session {}: merged {} new artifacts ({} total)",
            session.session_id(),
            added,
            session.artifacts().len()
        );

        if session.conversation_ended() {
            tracing::info!("Session {} already ended; not replying", session.session_id());
            return TurnOutcome::silent(
                StrategyDecision::end("conversation already ended"),
                artifacts,
                session,
            );
        }

        // 2. Strategy.
        let decision = self.strategy.decide(session, &message).await;
        if !decision.should_engage {
            if decision.goal == ConversationGoal::WrapUp {
                session.mark_ended();
                tracing::info!("Session {} ended: {}", session.session_id(), decision.reasoning);
            }
            return TurnOutcome::silent(decision, artifacts, session);
        }

        // 3. Response generation, current message excluded from its history.
        let candidate = {
            let history = session.history();
            let prior = &history[..history.len().saturating_sub(1)];
            let start = prior.len().saturating_sub(self.persona_window);
            self.persona.respond(&message, &prior[start..], decision.goal).await
        };
        let Some(candidate) = candidate else {
            return TurnOutcome::silent(decision, artifacts, session);
        };

        // 4. Safety gate.
        let (reply, gate_triggered) = match self.guard.check_response(&candidate) {
            Ok(()) => (candidate, false),
            Err(violation) => {
                tracing::warn!("Safety guard replaced a reply: {}", violation);
                session.add_note(format!("Safety guard triggered: {}", violation.reason));
                (self.guard.fallback_reply().to_string(), true)
            }
        };
        session.push_message(Message::subject(reply.clone()));

        // 5. Notes.
        let note = self.notes.summarize(session).await;
        session.add_note(note);

        if decision.goal == ConversationGoal::WrapUp {
            session.mark_ended();
            tracing::info!("Session {} wrapped up: {}", session.session_id(), decision.reasoning);
        }

        TurnOutcome {
            reply: Some(reply),
            decision,
            artifacts,
            gate_triggered,
            conversation_ended: session.conversation_ended(),
        }
    }
}
