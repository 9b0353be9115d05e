//! Open chat windows and the replies travelling back from chat tasks.

use tokio::task::JoinHandle;

use pawz_chat::{ChatReply, ChatTurn};
use pawz_core::types::PetId;

/// One open chat window.
#[derive(Debug)]
pub struct ChatSession {
    generation: u64,
    history: Vec<ChatTurn>,
    pending: Option<JoinHandle<()>>,
}

impl ChatSession {
    pub(crate) fn new(generation: u64) -> Self {
        Self {
            generation,
            history: Vec::new(),
            pending: None,
        }
    }

    /// Lines exchanged in this window, oldest first.
    #[must_use]
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// A message was sent and its reply has not been applied yet.
    #[must_use]
    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn push_user(&mut self, text: &str) -> Vec<ChatTurn> {
        self.history.push(ChatTurn::user(text));
        self.history.clone()
    }

    pub(crate) fn set_pending(&mut self, handle: JoinHandle<()>) {
        self.pending = Some(handle);
    }

    pub(crate) fn complete(&mut self, reply: &str) {
        self.history.push(ChatTurn::assistant(reply));
        self.pending = None;
    }

    /// Stop the in-flight request, if any. Its reply is never delivered.
    pub(crate) fn cancel(self) {
        if let Some(handle) = self.pending {
            handle.abort();
        }
    }
}

/// A finished chat request on its way back to the tick loop.
#[derive(Debug)]
pub(crate) struct ChatDelivery {
    pub pet: PetId,
    pub generation: u64,
    pub user: String,
    pub reply: ChatReply,
}
