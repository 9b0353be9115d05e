//! Error types for the pawz core library.

use thiserror::Error;

use crate::types::{BehaviorState, PetId, Species};

/// Top-level error type for all pawz core operations.
#[derive(Error, Debug)]
pub enum PawzError {
    /// A save file could not be read or failed validation.
    ///
    /// Never fatal: the loader falls back to the backup, then to an
    /// empty registry.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A species was asked to enter a state it has no animation for.
    ///
    /// This indicates data-model corruption rather than a runtime condition.
    #[error("Invalid state {state} for species {species}")]
    InvalidState {
        /// The pet's species.
        species: Species,
        /// The rejected state.
        state: BehaviorState,
    },

    /// No pet with the given ID is registered.
    #[error("Pet not found: {0}")]
    PetNotFound(PetId),

    /// A pet with the same name and species already exists.
    #[error("A {species} named {name:?} already exists")]
    DuplicatePet {
        /// Requested name.
        name: String,
        /// Requested species.
        species: Species,
    },

    /// A pet name was empty after trimming.
    #[error("Invalid pet name: {0:?}")]
    InvalidName(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, PawzError>;
