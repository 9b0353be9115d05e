//! # pawz-chat: Chat Collaborator for Pawz
//!
//! Turns a pet's memory and the open conversation into a reply:
//!   - **Ollama** (local, recommended default)
//!   - **OpenAI-compatible API** (also works with llama.cpp server, Together, etc.)
//!   - **None**: every request falls back to a canned species reply
//!
//! The host never sees an error from this crate. [`ChatService::reply`]
//! bounds every backend call with a timeout and degrades to a canned line
//! ("Bawk bawk!") on any failure, tagging the reply so the UI can tell.
//!
//! # Architecture
//!
//! ```text
//! PetProfile + history ──► prompt ──► ChatBackend::request_reply ──► ChatReply
//!                                       │ timeout / error
//!                                       └──► fallback::canned_reply
//! ```

pub mod client;
pub mod error;
pub mod fallback;
pub mod prompt;
pub mod service;
pub mod types;

pub use client::{LlmClient, LlmProvider};
pub use error::ChatError;
pub use prompt::PromptTemplate;
pub use service::{ChatBackend, ChatService, ChatStats};
pub use types::{ChatReply, ChatRequest, ChatTurn, PetProfile, ReplySource, Role};
