//! Chat service: bounded, never-failing replies.
//!
//! Every backend call runs under [`tokio::time::timeout`]. Whatever goes
//! wrong (no provider, HTTP failure, empty text, too slow) the caller gets a
//! [`ChatReply`] with [`ReplySource::Fallback`] and a canned species line,
//! so the chat bubble always has something to show.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, warn};

use pawz_core::config::ChatConfig;

use crate::error::ChatError;
use crate::fallback;
use crate::prompt::PromptTemplate;
use crate::types::{ChatReply, ChatRequest, ChatTurn, PetProfile, ReplySource};

/// Anything that can turn a rendered request into reply text.
///
/// Implementations may answer immediately (canned, scripted) or after a
/// slow network call; the service bounds the wait either way.
pub trait ChatBackend: Send + Sync + 'static {
    /// Produce the pet's next line.
    fn request_reply(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<String, ChatError>> + Send;
}

/// Counters for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatStats {
    /// Requests started.
    pub requests: u64,
    /// Replies that came from the model.
    pub model_replies: u64,
    /// Replies that fell back to a canned line.
    pub fallbacks: u64,
    /// Fallbacks caused by the timeout.
    pub timeouts: u64,
}

/// Renders prompts, calls the backend, and degrades gracefully.
pub struct ChatService<B> {
    backend: Arc<B>,
    config: ChatConfig,
    template: PromptTemplate,
    stats: Mutex<ChatStats>,
}

impl<B> std::fmt::Debug for ChatService<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("provider", &self.config.provider)
            .field("timeout_ms", &self.config.request_timeout_ms)
            .field("stats", &*self.stats.lock())
            .finish_non_exhaustive()
    }
}

impl<B: ChatBackend> ChatService<B> {
    /// Create a service with the built-in prompt template.
    #[must_use]
    pub fn new(backend: B, config: ChatConfig) -> Self {
        Self::with_template(backend, config, PromptTemplate::builtin())
    }

    /// Create a service with a custom prompt template.
    #[must_use]
    pub fn with_template(backend: B, config: ChatConfig, template: PromptTemplate) -> Self {
        Self {
            backend: Arc::new(backend),
            config,
            template,
            stats: Mutex::new(ChatStats::default()),
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Snapshot of the counters.
    #[must_use]
    pub fn stats(&self) -> ChatStats {
        *self.stats.lock()
    }

    /// Reply to the newest user message in `history`.
    ///
    /// Never fails: errors and timeouts produce a canned reply.
    pub async fn reply(&self, profile: &PetProfile, history: &[ChatTurn]) -> ChatReply {
        self.stats.lock().requests += 1;
        let request = self.template.build_request(profile, history, &self.config);
        let limit = Duration::from_millis(self.config.request_timeout_ms);

        let start = Instant::now();
        let outcome = match tokio::time::timeout(limit, self.backend.request_reply(&request)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            Ok(Ok(_)) => Err(ChatError::EmptyReply),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ChatError::Timeout(self.config.request_timeout_ms)),
        };
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(text) => {
                self.stats.lock().model_replies += 1;
                debug!(pet = %profile.name, latency_ms, "Model replied");
                ChatReply {
                    text,
                    source: ReplySource::Model,
                    latency_ms,
                }
            }
            Err(e) => {
                {
                    let mut stats = self.stats.lock();
                    stats.fallbacks += 1;
                    if matches!(e, ChatError::Timeout(_)) {
                        stats.timeouts += 1;
                    }
                }
                match e {
                    ChatError::Unavailable(_) => debug!(pet = %profile.name, "No chat model; using canned reply"),
                    _ => warn!(pet = %profile.name, error = %e, "Chat failed; using canned reply"),
                }
                let text = fallback::canned_reply(profile.species, &mut rand::thread_rng()).to_string();
                ChatReply {
                    text,
                    source: ReplySource::Fallback,
                    latency_ms,
                }
            }
        }
    }
}
