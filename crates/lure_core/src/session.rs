//! Per-conversation session state and the in-process session registry.
//!
//! A `SessionState` is mutated by exactly one pipeline turn at a time. The
//! `SessionManager` hands out one async mutex per session so callers serialize
//! turns per conversation while different conversations proceed in parallel.

use crate::artifacts::ArtifactSet;
use crate::Message;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

// ============================================================================
// SessionState
// ============================================================================

#[derive(Debug, Clone)]
pub struct SessionState {
    session_id: String,
    history: Vec<Message>,
    artifacts: ArtifactSet,
    conversation_ended: bool,
    final_decision_reason: Option<String>,
    scam_confidence: f32,
    agent_notes: Vec<String>,
    turn_count: u32,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            history: Vec::new(),
            artifacts: ArtifactSet::new(),
            conversation_ended: false,
            final_decision_reason: None,
            scam_confidence: 0.0,
            agent_notes: Vec::new(),
            turn_count: 0,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Full history in insertion order.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// The most recent `n` messages.
    pub fn recent(&self, n: usize) -> &[Message] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    pub fn message_count(&self) -> usize {
        self.history.len()
    }

    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    pub fn conversation_ended(&self) -> bool {
        self.conversation_ended
    }

    pub fn final_decision_reason(&self) -> Option<&str> {
        self.final_decision_reason.as_deref()
    }

    pub fn scam_confidence(&self) -> f32 {
        self.scam_confidence
    }

    pub fn agent_notes(&self) -> &[String] {
        &self.agent_notes
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    // --- mutation (pipeline only) ---

    pub fn begin_turn(&mut self) {
        self.turn_count += 1;
    }

    /// Append a message. History is append-only.
    pub fn push_message(&mut self, message: Message) {
        self.history.push(message);
    }

    /// Union `artifacts` into the session set; returns the number added.
    pub fn merge_artifacts(&mut self, artifacts: &ArtifactSet) -> usize {
        self.artifacts.merge(artifacts)
    }

    pub fn add_note(&mut self, note: impl Into<String>) {
        self.agent_notes.push(note.into());
    }

    pub fn mark_ended(&mut self) {
        self.conversation_ended = true;
    }

    /// Record a scam detection result.
    ///
    /// Confidence only ever rises; the first positive detection fixes the reason.
    pub fn record_detection(&mut self, is_scam: bool, confidence: f32, reason: &str) {
        let confidence = if confidence.is_finite() { confidence.clamp(0.0, 1.0) } else { 0.0 };
        if confidence > self.scam_confidence {
            self.scam_confidence = confidence;
        }
        if is_scam && self.final_decision_reason.is_none() && !reason.trim().is_empty() {
            self.final_decision_reason = Some(reason.trim().to_string());
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            conversation_history: self.history.clone(),
            extracted_intelligence: self.artifacts.clone(),
            conversation_ended: self.conversation_ended,
            final_decision_reason: self.final_decision_reason.clone(),
            scam_confidence: self.scam_confidence,
            agent_notes: self.agent_notes.clone(),
            turn_count: self.turn_count,
        }
    }
}

/// Observable state surface handed to persistence collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub conversation_history: Vec<Message>,
    pub extracted_intelligence: ArtifactSet,
    pub conversation_ended: bool,
    pub final_decision_reason: Option<String>,
    pub scam_confidence: f32,
    pub agent_notes: Vec<String>,
    pub turn_count: u32,
}

// ============================================================================
// SessionManager
// ============================================================================

pub type SharedSession = Arc<Mutex<SessionState>>;

#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, SharedSession>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `session_id`, creating it on first contact.
    pub async fn get_or_create(&self, session_id: &str) -> SharedSession {
        if let Some(existing) = self.sessions.read().await.get(session_id) {
            return existing.clone();
        }
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!("Creating session {}", session_id);
                Arc::new(Mutex::new(SessionState::new(session_id)))
            })
            .clone()
    }

    pub async fn get(&self, session_id: &str) -> Option<SharedSession> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
        let session = self.get(session_id).await?;
        let guard = session.lock().await;
        Some(guard.snapshot())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

// ============================================================================
// Tests
// ============================================================================
