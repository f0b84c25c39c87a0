//! Session-aware entry point: detection plus one pipeline turn per message.

use crate::detection::{Detection, ScamDetector};
use crate::llm::LlmClient;
use crate::pipeline::{Pipeline, TurnOutcome};
use crate::providers;
use lure_core::{LureConfig, Message, SessionManager, SessionSnapshot};
use std::sync::Arc;

pub struct HoneypotService {
    pipeline: Pipeline,
    detector: ScamDetector,
    sessions: SessionManager,
    detection_window: usize,
}

impl HoneypotService {
    pub fn new(client: Option<Arc<dyn LlmClient>>, config: &LureConfig) -> Self {
        Self {
            pipeline: Pipeline::new(client.clone(), config),
            detector: ScamDetector::new(client, config.extraction.phone.clone()),
            sessions: SessionManager::new(),
            detection_window: config.engagement.detection_window,
        }
    }

    /// Build with the provider named in `config.llm`.
    pub fn from_config(config: &LureConfig) -> Self {
        Self::new(providers::build_client(&config.llm), config)
    }

    /// Process one counterparty message for `session_id`.
    ///
    /// Turns on the same session are serialized; different sessions run concurrently.
    pub async fn handle_message(&self, session_id: &str, text: &str) -> (Detection, TurnOutcome) {
        let session = self.sessions.get_or_create(session_id).await;
        let mut state = session.lock().await;

        let message = Message::counterparty(text);
        let detection = self
            .detector
            .detect(&message, state.recent(self.detection_window))
            .await;
        state.record_detection(detection.is_scam, detection.confidence, &detection.reason);

        let outcome = self.pipeline.process_message(&mut state, message).await;
        (detection, outcome)
    }

    pub async fn snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
        self.sessions.snapshot(session_id).await
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }
}
