//! # Pawz Core Library
//!
//! Frontend-agnostic simulation for desktop pets.
//!
//! Every pet is a [`PetRecord`] owned by the host application. The core
//! drives it through a handful of components, each a plain struct the host
//! calls from its tick and input handlers:
//!
//! - [`MoodScheduler`](mood::MoodScheduler): hourly decay, daily re-roll, petting
//! - [`BehaviorStateMachine`](behavior::BehaviorStateMachine): STAND / WALK / SIT / EAT with dwell timers
//! - [`AnimationDriver`](animation::AnimationDriver): sprite frames plus the emote overlay
//! - [`PersistenceManager`](persistence::PersistenceManager): atomic save, single backup, fallback load
//!
//! Nothing here reads the wall clock or an ambient RNG: callers pass `now`
//! and an `Rng`, so a seeded run is fully reproducible.
//!
//! ## Performance Contract
//!
//! Designed for a 60 Hz UI thread:
//! - Frame tick (behavior + animation, 20 pets): < 50μs
//! - Save (20 pets): < 5ms

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod animation;
pub mod behavior;
pub mod config;
pub mod error;
pub mod memory;
pub mod mood;
pub mod persistence;
pub mod pet;
pub mod sprites;
pub mod types;

pub use config::PawzConfig;
pub use error::PawzError;
pub use memory::MemoryLog;
pub use pet::PetRecord;
pub use types::*;
