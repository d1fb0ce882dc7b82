//! Command-line interface for optichat.
//!
//! Provides a one-shot `ask` command and an interactive `repl` loop around
//! the conversation orchestrator.

mod commands;

pub use commands::{parse_cli, run_with_cli, Cli};
