//! Error types for the desktop host.

use thiserror::Error;

use pawz_chat::ChatError;
use pawz_core::PawzError;

/// Errors surfaced by [`PetApp`](crate::PetApp) operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// A core operation failed.
    #[error(transparent)]
    Core(#[from] PawzError),

    /// The chat collaborator could not be configured.
    #[error(transparent)]
    Chat(#[from] ChatError),

    /// Chat needs a tokio runtime to run requests on.
    #[error("No async runtime available for chat: {0}")]
    Runtime(String),

    /// The logging subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, AppError>;
