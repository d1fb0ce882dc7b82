//! Error types for the conversational agents.

use thiserror::Error;

/// Errors that escape the orchestrator to its caller.
///
/// Only configuration-class problems and writer-side LLM transport failures
/// surface here; extraction, safety-rejection, execution, and interpretation
/// failures are absorbed into the debug/retry loop and reach the user only as
/// the fixed apology after the budget runs out.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Agent configuration error.
    #[error("Agent configuration error: {0}")]
    ConfigurationError(String),

    /// Underlying template error (missing marker, unsupported solver).
    #[error("Template error: {0}")]
    Template(#[from] crate::error::TemplateError),

    /// Error from the LLM provider while talking to the writer role.
    #[error("LLM error: {0}")]
    LlmError(String),
}

impl From<crate::error::LlmError> for AgentError {
    fn from(err: crate::error::LlmError) -> Self {
        AgentError::LlmError(err.to_string())
    }
}

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
