//! Time-driven mood rules.
//!
//! Three rules touch [`PetRecord::mood`]:
//!
//! - **Decay**: one `decay_per_hour` step per whole hour elapsed since the
//!   pet's decay checkpoint. The checkpoint advances by whole hours only, so
//!   irregular or repeated evaluations never double-count.
//! - **Reset**: on the first evaluation of a new UTC calendar day (and at
//!   process start) mood is re-rolled uniformly in `[reset_min, reset_max]`.
//!   A due reset replaces decay for that evaluation.
//! - **Petting**: `+pet_increase`, applied by the caller after [`MoodScheduler::apply`].
//!
//! Every mutation clamps into `[min, max]`.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::debug;

use crate::config::MoodConfig;
use crate::pet::PetRecord;
use crate::types::Mood;

/// What an evaluation did to a pet's mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoodChange {
    /// Nothing was due.
    Unchanged,
    /// Hourly decay was applied.
    Decayed {
        /// Whole hours consumed from the checkpoint.
        hours: i64,
        /// Mood before.
        from: Mood,
        /// Mood after.
        to: Mood,
    },
    /// Daily re-roll.
    Reset {
        /// Mood before.
        from: Mood,
        /// Mood after.
        to: Mood,
    },
}

/// Applies the decay, reset and petting rules.
#[derive(Debug, Clone)]
pub struct MoodScheduler {
    config: MoodConfig,
}

impl MoodScheduler {
    /// Create a scheduler with the given bounds and rates.
    #[must_use]
    pub fn new(config: MoodConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &MoodConfig {
        &self.config
    }

    /// Evaluate the time-driven rules at `now`. A due reset wins over decay.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        pet: &mut PetRecord,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> MoodChange {
        if self.reset_due(pet, now) {
            self.reset(pet, now, rng)
        } else {
            self.decay(pet, now)
        }
    }

    /// Whether `now` falls on a later calendar day than the last reset.
    #[must_use]
    pub fn reset_due(&self, pet: &PetRecord, now: DateTime<Utc>) -> bool {
        pet.mood_clock
            .last_reset_day
            .is_none_or(|day| now.date_naive() > day)
    }

    /// Re-roll mood unconditionally and restart the decay clock.
    pub fn reset<R: Rng + ?Sized>(
        &self,
        pet: &mut PetRecord,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> MoodChange {
        let from = pet.mood;
        let rolled = rng.gen_range(self.config.reset_min..=self.config.reset_max);
        let to = Mood::new(i64::from(rolled)).shifted(0, self.config.min, self.config.max);
        pet.mood = to;
        pet.mood_clock.last_reset_day = Some(now.date_naive());
        pet.mood_clock.last_decay_at = Some(now);

        debug!(pet = %pet.id, from = %from, to = %to, "Mood reset");
        MoodChange::Reset { from, to }
    }

    /// Apply hourly decay for every whole hour since the checkpoint.
    pub fn decay(&self, pet: &mut PetRecord, now: DateTime<Utc>) -> MoodChange {
        let Some(checkpoint) = pet.mood_clock.last_decay_at else {
            pet.mood_clock.last_decay_at = Some(now);
            return MoodChange::Unchanged;
        };

        let hours = now.signed_duration_since(checkpoint).num_hours();
        if hours < 1 {
            return MoodChange::Unchanged;
        }

        let from = pet.mood;
        let delta = hours.saturating_mul(i64::from(self.config.decay_per_hour));
        let to = from.shifted(-delta, self.config.min, self.config.max);
        pet.mood = to;
        pet.mood_clock.last_decay_at = Some(checkpoint + Duration::hours(hours));

        debug!(pet = %pet.id, hours, from = %from, to = %to, "Mood decayed");
        MoodChange::Decayed { hours, from, to }
    }

    /// A click: raise mood by `pet_increase`, capped at `max`. Returns the new mood.
    pub fn pet(&self, pet: &mut PetRecord) -> Mood {
        pet.mood = pet.mood.shifted(
            i64::from(self.config.pet_increase),
            self.config.min,
            self.config.max,
        );
        pet.mood
    }
}
