//! optichat: conversational copilot for supply-chain optimization models.
//!
//! A user asks a natural-language question; a writer LLM role proposes a code
//! snippet; a safeguard role vets it; the snippet is injected into a template
//! solver script at a named marker; the merged script runs in a sandboxed
//! Python subprocess under a deadline; and the solver's terminal status is
//! interpreted and narrated back against a cached baseline run. Failed
//! attempts are fed back to the writer up to a fixed debug budget.

// Core modules
pub mod agents;
pub mod cli;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod sandbox;
pub mod solver;
pub mod template;
pub mod utils;

// Re-export commonly used error types
pub use error::{LlmError, SolverError, TemplateError};
