//! LLM Client: HTTP backends for Ollama and OpenAI-compatible servers.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use pawz_core::config::ChatConfig;

use crate::error::ChatError;
use crate::service::ChatBackend;
use crate::types::ChatRequest;

/// Provider backend for chat inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmProvider {
    /// Ollama running locally (recommended).
    Ollama {
        /// e.g. `http://localhost:11434`.
        base_url: String,
    },
    /// OpenAI-compatible API (llama.cpp server, Together, etc.).
    OpenAiCompatible {
        /// API root without `/v1`.
        base_url: String,
        /// Bearer token.
        api_key: String,
    },
    /// No model; every call fails and the pet answers with a canned line.
    None,
}

/// Routes requests to the configured provider.
#[derive(Debug, Clone)]
pub struct LlmClient {
    provider: LlmProvider,
    http: Client,
    model: String,
    max_retries: u32,
}

impl LlmClient {
    /// Create a new client.
    #[must_use]
    pub fn new(provider: LlmProvider, model: impl Into<String>, max_retries: u32) -> Self {
        Self {
            provider,
            http: Client::new(),
            model: model.into(),
            max_retries,
        }
    }

    /// Create a client with no backend (every reply is canned).
    #[must_use]
    pub fn none() -> Self {
        Self::new(LlmProvider::None, String::new(), 0)
    }

    /// Build a client from the `[chat]` config section.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::ConfigError`] for an unknown provider or an
    /// OpenAI-compatible provider without an API key.
    pub fn from_config(config: &ChatConfig) -> Result<Self, ChatError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        let provider = match config.provider.to_ascii_lowercase().as_str() {
            "none" | "" => LlmProvider::None,
            "ollama" => LlmProvider::Ollama { base_url },
            "openai" => {
                let api_key = config.api_key.clone().ok_or_else(|| {
                    ChatError::ConfigError("openai provider requires chat.api_key".into())
                })?;
                LlmProvider::OpenAiCompatible { base_url, api_key }
            }
            other => {
                return Err(ChatError::ConfigError(format!("unknown chat provider '{other}'")));
            }
        };
        Ok(Self::new(provider, config.model.clone(), config.max_retries))
    }

    /// The configured provider.
    #[must_use]
    pub fn provider(&self) -> &LlmProvider {
        &self.provider
    }

    /// Check if the client has a backend configured.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !matches!(self.provider, LlmProvider::None)
    }

    /// Generate a reply.
    ///
    /// Returns `Err` if no backend is configured or all retries fail. The
    /// caller falls back to a canned reply on error.
    pub async fn generate(&self, request: &ChatRequest) -> Result<String, ChatError> {
        match &self.provider {
            LlmProvider::None => Err(ChatError::Unavailable("no chat provider configured".into())),
            LlmProvider::Ollama { base_url } => {
                let url = format!("{base_url}/api/chat");
                let body = json!({
                    "model": self.model,
                    "messages": request.messages,
                    "stream": false,
                    "options": {
                        "temperature": request.temperature,
                        "num_predict": request.max_tokens,
                    }
                });
                self.post_with_retries("Ollama", &url, None, &body, request.timeout_ms, |json| {
                    json["message"]["content"].as_str().map(str::to_string)
                })
                .await
            }
            LlmProvider::OpenAiCompatible { base_url, api_key } => {
                let url = format!("{base_url}/v1/chat/completions");
                let body = json!({
                    "model": self.model,
                    "messages": request.messages,
                    "max_tokens": request.max_tokens,
                    "temperature": request.temperature,
                });
                self.post_with_retries("OpenAI", &url, Some(api_key.as_str()), &body, request.timeout_ms, |json| {
                    json["choices"][0]["message"]["content"]
                        .as_str()
                        .map(str::to_string)
                })
                .await
            }
        }
    }

    async fn post_with_retries(
        &self,
        backend: &str,
        url: &str,
        api_key: Option<&str>,
        body: &serde_json::Value,
        timeout_ms: u64,
        extract: impl Fn(&serde_json::Value) -> Option<String>,
    ) -> Result<String, ChatError> {
        let mut last_error = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                debug!("Retrying {backend} call (attempt {}/{})", attempt + 1, self.max_retries + 1);
            }

            let start = Instant::now();
            let mut builder = self
                .http
                .post(url)
                .json(body)
                .timeout(Duration::from_millis(timeout_ms));
            if let Some(key) = api_key {
                builder = builder.header("Authorization", format!("Bearer {key}"));
            }

            match builder.send().await {
                Ok(resp) if resp.status().is_success() => {
                    let json: serde_json::Value = resp
                        .json()
                        .await
                        .map_err(|e| ChatError::ParseError(e.to_string()))?;
                    let text = extract(&json)
                        .ok_or_else(|| ChatError::ParseError(format!("{backend} response has no message content")))?;
                    debug!(
                        backend,
                        model = %self.model,
                        latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                        "Chat reply received"
                    );
                    return Ok(text);
                }
                Ok(resp) => {
                    last_error = format!("HTTP {}", resp.status());
                    warn!("{backend} returned error: {last_error}");
                }
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() {
                        warn!("{backend} request timed out after {timeout_ms}ms");
                    } else {
                        warn!("{backend} request failed: {last_error}");
                    }
                }
            }
        }

        Err(ChatError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last_error,
        })
    }
}

impl ChatBackend for LlmClient {
    async fn request_reply(&self, request: &ChatRequest) -> Result<String, ChatError> {
        self.generate(request).await
    }
}
