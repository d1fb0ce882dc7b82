//! Conversational roles and the orchestration core.
//!
//! The writer and safeguard "agents" are not independent services: they are
//! single-threaded conversational state slots the orchestrator resets on each
//! user turn, backed by the same LLM provider with different system prompts.

pub mod error;
pub mod orchestrator;
pub mod safeguard;
pub mod types;

pub use error::{AgentError, AgentResult};
pub use orchestrator::{ChatOrchestrator, OrchestratorConfig};
pub use safeguard::{SafetyGate, SafetyVerdict};
pub use types::{ChatRole, Transcript, Turn};
