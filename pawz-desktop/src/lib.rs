//! # Pawz Desktop
//!
//! Hosts the pets for a renderer. The renderer owns windows, sprites and
//! input; this crate owns everything else.
//!
//! ```text
//!   renderer ──UiEvent──▶ PetApp ──RenderFrame──▶ renderer
//!                           │
//!        ┌──────────────────┼───────────────────┐
//!        ▼                  ▼                   ▼
//!   MoodScheduler   BehaviorStateMachine   AnimationDriver
//!                           │
//!                   PersistenceManager (minute ticks, shutdown)
//!
//!   send_chat ──spawn──▶ ChatService task ──mpsc──▶ next frame tick
//! ```
//!
//! Ticks come from the host loop in [`runner`]: `on_frame_tick(dt)` every frame,
//! `on_minute_tick()` for autosave, `on_hour_tick()` and `on_day_rollover()`
//! for mood. Chat replies are applied on the frame tick that follows their
//! arrival, so the tick thread is the only writer of pet memory.

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod registry;
pub mod runner;
pub mod session;

pub use app::PetApp;
pub use error::AppError;
pub use events::{DeliveredReply, EventOutcome, RenderFrame, UiEvent};
pub use registry::PetRegistry;
