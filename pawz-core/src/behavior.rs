//! Pet behavior state machine.
//!
//! Per tick, for a pet that is neither dragged nor chatting:
//!
//! | State | Leaves when | Goes to |
//! |-------|-------------|---------|
//! | STAND | dwell elapsed | WALK / SIT / EAT, weighted random |
//! | WALK  | target reached | STAND |
//! | SIT   | dwell elapsed | STAND |
//! | EAT   | dwell elapsed | STAND |
//!
//! Dwell lengths are sampled on entry from the configured ranges. Walking
//! follows a Manhattan path, horizontal leg first. All randomness comes from
//! the caller's RNG, so a seeded RNG and a scripted tick sequence reproduce
//! the same run.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use tracing::{debug, trace};

use crate::config::{BehaviorConfig, DwellRange, GeneralConfig};
use crate::error::Result;
use crate::pet::PetRecord;
use crate::types::{BehaviorState, Direction, Position, Species};

/// Rectangle a pet's top-left corner may occupy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoamArea {
    /// Largest x.
    pub max_x: f32,
    /// Largest y.
    pub max_y: f32,
}

impl RoamArea {
    /// Screen size minus one scaled sprite, so pets stay fully visible.
    #[must_use]
    pub fn from_general(general: &GeneralConfig) -> Self {
        let sprite = general.scaled_sprite_size();
        Self {
            max_x: (general.screen_width - sprite).max(0.0),
            max_y: (general.screen_height - sprite).max(0.0),
        }
    }

    /// Clamp a position into the area.
    #[must_use]
    pub fn clamp(&self, p: Position) -> Position {
        Position::new(p.x.clamp(0.0, self.max_x), p.y.clamp(0.0, self.max_y))
    }
}

/// A state transition taken during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    /// State left.
    pub from: BehaviorState,
    /// State entered.
    pub to: BehaviorState,
}

/// Drives STAND / WALK / SIT / EAT for every pet.
#[derive(Debug, Clone)]
pub struct BehaviorStateMachine {
    config: BehaviorConfig,
    area: RoamArea,
}

impl BehaviorStateMachine {
    /// Create a machine with the given tuning and roaming area.
    #[must_use]
    pub fn new(config: BehaviorConfig, area: RoamArea) -> Self {
        Self { config, area }
    }

    /// The roaming area.
    #[must_use]
    pub fn area(&self) -> RoamArea {
        self.area
    }

    /// Dwell range for a timed state; `None` for WALK.
    #[must_use]
    pub fn dwell_range(&self, state: BehaviorState) -> Option<DwellRange> {
        match state {
            BehaviorState::Stand => Some(self.config.stand_dwell),
            BehaviorState::Sit => Some(self.config.sit_dwell),
            BehaviorState::Eat => Some(self.config.eat_dwell),
            BehaviorState::Walk => None,
        }
    }

    fn sample_dwell<R: Rng + ?Sized>(&self, state: BehaviorState, rng: &mut R) -> f32 {
        match self.dwell_range(state) {
            Some(range) if range.max_secs > range.min_secs => {
                rng.gen_range(range.min_secs..=range.max_secs)
            }
            Some(range) => range.min_secs,
            None => 0.0,
        }
    }

    /// Sample a walk target inside the roaming area.
    pub fn sample_target<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        let x = if self.area.max_x > 0.0 { rng.gen_range(0.0..=self.area.max_x) } else { 0.0 };
        let y = if self.area.max_y > 0.0 { rng.gen_range(0.0..=self.area.max_y) } else { 0.0 };
        Position::new(x, y)
    }

    /// Start (or restart) the pet in STAND with a fresh dwell timer.
    ///
    /// # Errors
    /// Propagates [`PawzError::InvalidState`](crate::PawzError::InvalidState)
    /// from the record; STAND is supported by every species.
    pub fn begin<R: Rng + ?Sized>(
        &self,
        pet: &mut PetRecord,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<()> {
        pet.enter_state(BehaviorState::Stand, now)?;
        pet.runtime.dwell_secs = self.sample_dwell(BehaviorState::Stand, rng);
        Ok(())
    }

    /// Evaluate one tick. `now` is the tick's timestamp, `dt` the seconds
    /// since the previous tick.
    ///
    /// # Errors
    /// Returns [`PawzError::InvalidState`](crate::PawzError::InvalidState) if
    /// the pet's record has been corrupted into an unsupported state.
    pub fn tick<R: Rng + ?Sized>(
        &self,
        pet: &mut PetRecord,
        now: DateTime<Utc>,
        dt: f32,
        rng: &mut R,
    ) -> Result<Option<StateChange>> {
        if pet.is_suspended() {
            return Ok(None);
        }
        pet.validate()?;

        match pet.state {
            BehaviorState::Stand => {
                if pet.seconds_in_state(now) < pet.runtime.dwell_secs {
                    return Ok(None);
                }
                match pick_next(pet.species, &self.config, rng) {
                    Some(next) => self.transition(pet, next, now, rng),
                    None => {
                        // Nothing to do for this species; stand a while longer.
                        self.begin(pet, now, rng)?;
                        Ok(None)
                    }
                }
            }
            BehaviorState::Walk => {
                if self.step_walk(pet, dt) {
                    self.transition(pet, BehaviorState::Stand, now, rng)
                } else {
                    Ok(None)
                }
            }
            BehaviorState::Sit | BehaviorState::Eat => {
                if pet.seconds_in_state(now) < pet.runtime.dwell_secs {
                    Ok(None)
                } else {
                    self.transition(pet, BehaviorState::Stand, now, rng)
                }
            }
        }
    }

    fn transition<R: Rng + ?Sized>(
        &self,
        pet: &mut PetRecord,
        to: BehaviorState,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Option<StateChange>> {
        let from = pet.state;
        pet.enter_state(to, now)?;
        pet.runtime.dwell_secs = self.sample_dwell(to, rng);
        if to == BehaviorState::Walk {
            let target = self.sample_target(rng);
            pet.runtime.target = Some(target);
            debug!(pet = %pet.id, x = target.x, y = target.y, "Walking to new target");
        }
        trace!(pet = %pet.id, from = %from, to = %to, "State transition");
        Ok(Some(StateChange { from, to }))
    }

    /// Move toward the walk target. Returns `true` once arrived.
    fn step_walk(&self, pet: &mut PetRecord, dt: f32) -> bool {
        let Some(target) = pet.runtime.target else {
            return true;
        };
        let mut budget = (self.config.walk_speed * dt.max(0.0)).max(0.0);
        let pos = &mut pet.position;

        let dx = target.x - pos.x;
        let mut x_done = dx.abs() <= f32::EPSILON;
        if !x_done && budget > 0.0 {
            pet.direction = if dx > 0.0 { Direction::Right } else { Direction::Left };
            if dx.abs() <= budget {
                pos.x = target.x;
                budget -= dx.abs();
                x_done = true;
            } else {
                pos.x += budget * dx.signum();
                budget = 0.0;
            }
        }

        let dy = target.y - pos.y;
        if x_done && dy.abs() > f32::EPSILON && budget > 0.0 {
            pet.direction = if dy > 0.0 { Direction::Down } else { Direction::Up };
            if dy.abs() <= budget {
                pos.y = target.y;
            } else {
                pos.y += budget * dy.signum();
            }
        }

        if pos.distance_to(&target) < self.config.arrival_epsilon {
            *pos = target;
            true
        } else {
            false
        }
    }

    /// Suspend behavior while the pet is being dragged.
    pub fn start_drag(&self, pet: &mut PetRecord) {
        pet.runtime.dragging = true;
        pet.runtime.target = None;
    }

    /// Follow the pointer during a drag.
    pub fn drag_to(&self, pet: &mut PetRecord, position: Position) {
        if pet.runtime.dragging {
            pet.position = self.area.clamp(position);
        }
    }

    /// Drop the pet at `position` and resume from STAND with a fresh dwell.
    ///
    /// # Errors
    /// See [`begin`](Self::begin).
    pub fn end_drag<R: Rng + ?Sized>(
        &self,
        pet: &mut PetRecord,
        position: Position,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<()> {
        pet.runtime.dragging = false;
        pet.position = self.area.clamp(position);
        self.begin(pet, now, rng)
    }
}

/// Weighted choice of the state that follows STAND, restricted to what the
/// species supports.
fn pick_next<R: Rng + ?Sized>(
    species: Species,
    config: &BehaviorConfig,
    rng: &mut R,
) -> Option<BehaviorState> {
    let candidates: Vec<(BehaviorState, f32)> = [
        (BehaviorState::Walk, config.weights.walk),
        (BehaviorState::Sit, config.weights.sit),
        (BehaviorState::Eat, config.weights.eat),
    ]
    .into_iter()
    .filter(|(state, weight)| species.supports(*state) && *weight > 0.0)
    .collect();

    let index = WeightedIndex::new(candidates.iter().map(|(_, w)| *w)).ok()?;
    Some(candidates[index.sample(rng)].0)
}
