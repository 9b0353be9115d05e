//! The per-pet record: identity, placement, mood, behavior and memory.
//!
//! Persisted fields are serialized as-is into the save file; runtime
//! bookkeeping (dwell timers, walk target, animation cursor, drag and chat
//! flags) lives in [`PetRuntime`] and is rebuilt after a load.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::animation::AnimationState;
use crate::config::MoodConfig;
use crate::error::{PawzError, Result};
use crate::memory::MemoryLog;
use crate::types::{BehaviorState, Direction, Mood, PetId, Position, Species};

/// Checkpoints that make the time-driven mood rules idempotent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodClock {
    /// Instant up to which hourly decay has been applied.
    #[serde(default)]
    pub last_decay_at: Option<DateTime<Utc>>,
    /// Calendar day (UTC) of the most recent re-roll.
    #[serde(default)]
    pub last_reset_day: Option<NaiveDate>,
}

/// Transient per-pet bookkeeping. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct PetRuntime {
    /// Sampled dwell for the current state, in seconds.
    pub dwell_secs: f32,
    /// Where a walking pet is heading.
    pub target: Option<Position>,
    /// The pet is being dragged; behavior is suspended.
    pub dragging: bool,
    /// A chat window is open; behavior is suspended.
    pub chatting: bool,
    /// Frame cursor for the base animation and emote overlay.
    pub animation: AnimationState,
}

/// One pet, exclusively owned by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetRecord {
    /// Stable identifier.
    pub id: PetId,
    /// User-supplied name.
    pub name: String,
    /// Species; fixes the sprite sheet and the allowed states.
    pub species: Species,
    /// Screen position.
    pub position: Position,
    /// Facing.
    #[serde(default)]
    pub direction: Direction,
    /// Current mood.
    pub mood: Mood,
    /// Current behavior state.
    pub state: BehaviorState,
    /// When the current state began. Reset to the load time on restore.
    #[serde(skip, default = "Utc::now")]
    pub state_entered_at: DateTime<Utc>,
    /// Current frame in the base sprite sheet. Derived by the animation driver.
    #[serde(skip)]
    pub frame_index: usize,
    /// When the pet was adopted.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Interaction history.
    #[serde(default)]
    pub memory: MemoryLog,
    /// Mood rule checkpoints.
    #[serde(default)]
    pub mood_clock: MoodClock,
    /// Runtime-only state.
    #[serde(skip)]
    pub runtime: PetRuntime,
}

impl PetRecord {
    /// Adopt a new pet: mood at the configured initial value, standing, with
    /// an empty memory.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        species: Species,
        position: Position,
        mood: &MoodConfig,
        now: DateTime<Utc>,
    ) -> Self {
        let mut memory = MemoryLog::new();
        memory.set_living_checkpoint(now);
        Self {
            id: PetId::new(),
            name: name.into().trim().to_string(),
            species,
            position,
            direction: Direction::Down,
            mood: Mood::new(i64::from(mood.initial)),
            state: BehaviorState::Stand,
            state_entered_at: now,
            frame_index: 0,
            created_at: now,
            memory,
            mood_clock: MoodClock {
                last_decay_at: Some(now),
                last_reset_day: Some(now.date_naive()),
            },
            runtime: PetRuntime::default(),
        }
    }

    /// Switch to `state`, stamping `now` as its start.
    ///
    /// # Errors
    /// Returns [`PawzError::InvalidState`] if the species has no such state;
    /// the record is left untouched.
    pub fn enter_state(&mut self, state: BehaviorState, now: DateTime<Utc>) -> Result<()> {
        if !self.species.supports(state) {
            return Err(PawzError::InvalidState {
                species: self.species,
                state,
            });
        }
        self.state = state;
        self.state_entered_at = now;
        if state != BehaviorState::Walk {
            self.runtime.target = None;
        }
        Ok(())
    }

    /// Check invariants that deserialization alone cannot.
    ///
    /// # Errors
    /// Returns [`PawzError::InvalidState`] for a species/state mismatch.
    pub fn validate(&self) -> Result<()> {
        if self.species.supports(self.state) {
            Ok(())
        } else {
            Err(PawzError::InvalidState {
                species: self.species,
                state: self.state,
            })
        }
    }

    /// Seconds spent in the current state as of `now`.
    #[must_use]
    pub fn seconds_in_state(&self, now: DateTime<Utc>) -> f32 {
        // f32 is ample for dwell comparisons.
        #[allow(clippy::cast_possible_truncation)]
        let secs = crate::memory::seconds_between(self.state_entered_at, now) as f32;
        secs
    }

    /// Behavior is paused while dragged or chatting.
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.runtime.dragging || self.runtime.chatting
    }

    /// Display label such as "Clucky the chicken".
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} the {}", self.name, self.species)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).single().expect("valid time")
    }

    fn chicken() -> PetRecord {
        PetRecord::new("Clucky", Species::Chicken, Position::new(10.0, 20.0), &MoodConfig::default(), t0())
    }

    #[test]
    fn new_pet_starts_fresh() {
        let pet = chicken();
        assert_eq!(pet.mood.value(), 50);
        assert_eq!(pet.state, BehaviorState::Stand);
        assert_eq!(pet.memory.times_petted, 0);
        assert!(pet.memory.conversation_summaries.is_empty());
        assert_eq!(pet.mood_clock.last_reset_day, Some(t0().date_naive()));
        assert_eq!(pet.label(), "Clucky the chicken");
    }

    #[test]
    fn enter_state_stamps_time() {
        let mut pet = chicken();
        let later = t0() + Duration::seconds(7);
        pet.enter_state(BehaviorState::Eat, later).expect("chickens eat");
        assert_eq!(pet.state, BehaviorState::Eat);
        assert_eq!(pet.state_entered_at, later);
        assert!((pet.seconds_in_state(later + Duration::seconds(2)) - 2.0).abs() < 1e-3);
    }

    #[test]
    fn unsupported_state_is_rejected() {
        let mut duck = PetRecord::new("Dewey", Species::Duck, Position::default(), &MoodConfig::default(), t0());
        let err = duck.enter_state(BehaviorState::Sit, t0()).expect_err("ducks do not sit");
        assert!(matches!(err, PawzError::InvalidState { .. }));
        assert_eq!(duck.state, BehaviorState::Stand);
    }

    #[test]
    fn runtime_fields_are_not_serialized() {
        let mut pet = chicken();
        pet.frame_index = 9;
        pet.runtime.dragging = true;
        let json = serde_json::to_value(&pet).expect("ser");
        assert!(json.get("frame_index").is_none());
        assert!(json.get("runtime").is_none());
        assert_eq!(json["state"], "STAND");
        assert_eq!(json["species"], "chicken");

        let back: PetRecord = serde_json::from_value(json).expect("de");
        assert_eq!(back.frame_index, 0);
        assert!(!back.runtime.dragging);
        assert_eq!(back.name, "Clucky");
    }
}
