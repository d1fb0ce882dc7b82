//! Conversation types shared by the orchestrator and its roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a participant in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    /// The human asking questions.
    User,
    /// The assistant replying to the human.
    Assistant,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in a conversation, with its ordering position implied by its
/// index in the owning [`Transcript`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Who produced this message.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
    /// When the message was recorded.
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Creates a turn recorded now.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Ordered conversation history with one counterpart.
///
/// The orchestrator keeps one transcript per user across their turns; the
/// writer and safeguard transcripts are rebuilt from scratch on each user
/// message, so this type only persists the user-facing exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a user message.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::new(ChatRole::User, content));
    }

    /// Records an assistant message.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::new(ChatRole::Assistant, content));
    }

    /// Number of recorded turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The recorded turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Renders the transcript as prompt-embeddable text.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|turn| format!("{}: {}", turn.role, turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
