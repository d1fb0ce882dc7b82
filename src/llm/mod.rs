//! LLM integration for optichat.
//!
//! Provides an OpenAI-compatible chat-completions client used for both
//! conversational roles (the code writer and the safeguard judge). Both roles
//! talk to the same backend; they differ only in system prompt and transcript.

pub mod client;

pub use client::{
    Choice, GenerationRequest, GenerationResponse, LlmClient, LlmProvider, Message, Usage,
};
