//! Core type definitions shared by every pawz component.
//!
//! All types are serializable; their on-disk spelling is part of the save
//! file format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::PawzError;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Stable unique identifier for a pet, assigned at creation.
///
/// Serialized as the hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PetId(pub Uuid);

impl PetId {
    /// Create a new random pet ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PetId {
    type Err = PawzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| PawzError::Serialization(format!("invalid pet id {s:?}: {e}")))
    }
}

// ---------------------------------------------------------------------------
// Species
// ---------------------------------------------------------------------------

/// The fixed set of pet species. Immutable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    /// Chicken.
    Chicken,
    /// Cat.
    Cat,
    /// Dog.
    Dog,
    /// Duck.
    Duck,
}

impl Species {
    /// Every species, in menu order.
    pub const ALL: [Species; 4] = [Self::Chicken, Self::Cat, Self::Dog, Self::Duck];

    /// Lowercase name used on disk and in prompts.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Chicken => "chicken",
            Self::Cat => "cat",
            Self::Dog => "dog",
            Self::Duck => "duck",
        }
    }

    /// Behavior states this species has animations for.
    #[must_use]
    pub fn states(self) -> &'static [BehaviorState] {
        const FULL: &[BehaviorState] = &[
            BehaviorState::Stand,
            BehaviorState::Walk,
            BehaviorState::Sit,
            BehaviorState::Eat,
        ];
        const NO_SIT: &[BehaviorState] =
            &[BehaviorState::Stand, BehaviorState::Walk, BehaviorState::Eat];

        match self {
            Self::Chicken | Self::Cat | Self::Dog => FULL,
            Self::Duck => NO_SIT,
        }
    }

    /// Whether `state` is in this species' state set.
    #[must_use]
    pub fn supports(self, state: BehaviorState) -> bool {
        self.states().contains(&state)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Species {
    type Err = PawzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chicken" => Ok(Self::Chicken),
            "cat" => Ok(Self::Cat),
            "dog" => Ok(Self::Dog),
            "duck" => Ok(Self::Duck),
            other => Err(PawzError::Serialization(format!("unknown species {other:?}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Behavior
// ---------------------------------------------------------------------------

/// A pet's current behavior state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BehaviorState {
    /// Standing still. Initial state.
    #[default]
    Stand,
    /// Walking toward a target position.
    Walk,
    /// Sitting down.
    Sit,
    /// Pecking / eating.
    Eat,
}

impl BehaviorState {
    /// Upper-case name as persisted.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stand => "STAND",
            Self::Walk => "WALK",
            Self::Sit => "SIT",
            Self::Eat => "EAT",
        }
    }
}

impl fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BehaviorState {
    type Err = PawzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STAND" => Ok(Self::Stand),
            "WALK" => Ok(Self::Walk),
            "SIT" => Ok(Self::Sit),
            "EAT" => Ok(Self::Eat),
            other => Err(PawzError::Serialization(format!("unknown state {other:?}"))),
        }
    }
}

/// Which way a pet is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Facing away from the viewer.
    Up,
    /// Facing the viewer.
    #[default]
    Down,
    /// Facing left.
    Left,
    /// Facing right.
    Right,
}

// ---------------------------------------------------------------------------
// Spatial
// ---------------------------------------------------------------------------

/// Screen coordinates of a pet's top-left corner, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance_to(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

// ---------------------------------------------------------------------------
// Mood
// ---------------------------------------------------------------------------

/// Pet mood, always within `[Mood::MIN, Mood::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Mood(u8);

impl Mood {
    /// Lowest possible mood.
    pub const MIN: u8 = 0;
    /// Highest possible mood.
    pub const MAX: u8 = 100;

    /// Create a mood, clamping `value` into range.
    #[must_use]
    pub fn new(value: i64) -> Self {
        // Clamped into 0..=100, so the narrowing cast is lossless.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let v = value.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8;
        Self(v)
    }

    /// Mood as an integer.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Add `delta` (may be negative), clamped to `[floor, ceiling]` and
    /// then to the absolute range.
    #[must_use]
    pub fn shifted(self, delta: i64, floor: u8, ceiling: u8) -> Self {
        let v = (i64::from(self.0) + delta).clamp(i64::from(floor), i64::from(ceiling));
        Self::new(v)
    }
}

impl Default for Mood {
    fn default() -> Self {
        Self(50)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Mood {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self::new(value))
        } else {
            Err(format!("mood {value} out of range"))
        }
    }
}

impl From<Mood> for u8 {
    fn from(mood: Mood) -> Self {
        mood.0
    }
}
