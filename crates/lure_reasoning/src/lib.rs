pub mod api_types;
pub mod detection;
pub mod error;
pub mod extraction;
pub mod llm;
pub mod notes;
pub mod persona;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod service;
pub mod stage;
pub mod strategy;
pub mod structured;

pub use detection::{Detection, ScamDetector};
pub use error::StageError;
pub use extraction::ExtractionEngine;
pub use llm::{CompletionParams, LlmClient};
pub use pipeline::{Pipeline, TurnOutcome};
pub use service::HoneypotService;
pub use stage::ResilientStage;
