//! Core types for chat requests and replies.

use serde::{Deserialize, Serialize};

use pawz_core::types::{Mood, Species};
use pawz_core::PetRecord;

/// Who said a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Persona and memory block.
    System,
    /// The human at the keyboard.
    User,
    /// The pet.
    Assistant,
}

/// One line of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Speaker.
    pub role: Role,
    /// Text.
    pub content: String,
}

impl ChatTurn {
    /// A line typed by the user.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// A line spoken by the pet.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// A system instruction.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Snapshot of the pet as the chat collaborator sees it.
///
/// Taken when a message is sent, so an in-flight request never reads the
/// live record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PetProfile {
    /// Pet name.
    pub name: String,
    /// Species.
    pub species: Species,
    /// Lifetime click count.
    pub times_petted: u64,
    /// Mood at snapshot time.
    pub mood: Mood,
    /// Most recent conversation summaries, oldest first.
    pub recent_summaries: Vec<String>,
}

impl PetProfile {
    /// Snapshot `pet`, keeping at most `history` summaries.
    #[must_use]
    pub fn from_record(pet: &PetRecord, history: usize) -> Self {
        Self {
            name: pet.name.clone(),
            species: pet.species,
            times_petted: pet.memory.times_petted,
            mood: pet.mood,
            recent_summaries: pet.memory.recent_summaries(history).to_vec(),
        }
    }
}

/// A fully rendered request for a backend.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// System prompt first, then the session's turns, ending with the user's
    /// newest message.
    pub messages: Vec<ChatTurn>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    pub temperature: f32,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl ChatRequest {
    /// The newest user message, if any.
    #[must_use]
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
    }
}

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    /// The configured model answered in time.
    Model,
    /// Canned species line, after a failure, a timeout, or with no backend.
    Fallback,
}

/// A reply ready to show in the chat bubble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// Text to display.
    pub text: String,
    /// Model or fallback.
    pub source: ReplySource,
    /// Wall time spent waiting on the backend.
    pub latency_ms: u64,
}
