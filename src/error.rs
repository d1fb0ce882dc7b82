//! Error types for optichat operations.
//!
//! Defines error types for the major subsystems:
//! - Template validation and code injection
//! - LLM API interactions
//! - Script execution and solver-state interpretation

use thiserror::Error;

/// Errors that can occur during template operations.
///
/// These are configuration-class errors: a malformed template or an unknown
/// solver kind is fatal and never enters the debug/retry loop.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Required marker '{0}' not found in template script")]
    MissingMarker(&'static str),

    #[error("Marker '{0}' could not be located for injection")]
    MarkerNotFound(&'static str),

    #[error("Unsupported solver kind: '{0}' (supported: gurobi)")]
    UnsupportedSolver(String),

    #[error("Failed to read template from '{path}': {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },
}

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Missing API base URL: OPTICHAT_API_BASE environment variable not set")]
    MissingApiBase,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while reading solver state out of an execution.
#[derive(Debug, Error)]
pub enum SolverError {
    #[error("No solver state found in script output")]
    StateNotFound,

    #[error("Failed to parse solver state: {0}")]
    StateParseError(String),
}
