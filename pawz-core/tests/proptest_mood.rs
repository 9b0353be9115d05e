//! Property-Based Tests for Pawz Core
//!
//! Uses `proptest` to check mood and behavior invariants under random
//! inputs: bounds always hold and time-driven rules never double-count.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use pawz_core::behavior::{BehaviorStateMachine, RoamArea};
use pawz_core::config::{BehaviorConfig, GeneralConfig, MoodConfig};
use pawz_core::mood::MoodScheduler;
use pawz_core::types::{Mood, Position, Species};
use pawz_core::PetRecord;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).single().expect("valid time")
}

fn arb_species() -> impl Strategy<Value = Species> {
    prop::sample::select(Species::ALL.to_vec())
}

// ---------------------------------------------------------------------------
// Property: mood stays within [min, max]
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn mood_new_always_clamped(raw in any::<i64>()) {
        let mood = Mood::new(raw);
        prop_assert!(mood.value() <= 100);
    }

    #[test]
    fn mood_bounded_under_any_event_sequence(
        seed in any::<u64>(),
        events in prop::collection::vec((any::<bool>(), 0i64..200), 1..60),
    ) {
        let config = MoodConfig::default();
        let scheduler = MoodScheduler::new(config.clone());
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pet = PetRecord::new("p", Species::Cat, Position::default(), &config, t0());
        let mut now = t0();

        for (is_click, minutes) in events {
            now += Duration::minutes(minutes);
            scheduler.apply(&mut pet, now, &mut rng);
            if is_click {
                scheduler.pet(&mut pet);
            }
            prop_assert!(pet.mood.value() >= config.min);
            prop_assert!(pet.mood.value() <= config.max);
        }
    }

    // -----------------------------------------------------------------------
    // Property: petting adds exactly one, or saturates at the ceiling
    // -----------------------------------------------------------------------

    #[test]
    fn petting_adds_one_or_saturates(start in 0u8..=100) {
        let config = MoodConfig::default();
        let scheduler = MoodScheduler::new(config.clone());
        let mut pet = PetRecord::new("p", Species::Dog, Position::default(), &config, t0());
        pet.mood = Mood::new(i64::from(start));
        let after = scheduler.pet(&mut pet).value();
        prop_assert_eq!(after, (start + 1).min(100));
    }

    // -----------------------------------------------------------------------
    // Property: decay depends only on whole hours elapsed, not on how often
    // it is evaluated
    // -----------------------------------------------------------------------

    #[test]
    fn decay_independent_of_evaluation_cadence(
        start in 0u8..=100,
        checks in prop::collection::vec(1i64..90, 1..40),
    ) {
        let config = MoodConfig::default();
        let scheduler = MoodScheduler::new(config.clone());
        let mut frequent = PetRecord::new("p", Species::Duck, Position::default(), &config, t0());
        frequent.mood = Mood::new(i64::from(start));
        let mut once = frequent.clone();

        let mut now = t0();
        for minutes in &checks {
            now += Duration::minutes(*minutes);
            scheduler.decay(&mut frequent, now);
        }
        scheduler.decay(&mut once, now);
        prop_assert_eq!(frequent.mood, once.mood);
        prop_assert_eq!(frequent.mood_clock.last_decay_at, once.mood_clock.last_decay_at);
    }

    // -----------------------------------------------------------------------
    // Property: species never enter unsupported states; pets stay on screen
    // -----------------------------------------------------------------------

    #[test]
    fn behavior_respects_species_and_area(species in arb_species(), seed in any::<u64>()) {
        let general = GeneralConfig::default();
        let machine = BehaviorStateMachine::new(BehaviorConfig::default(), RoamArea::from_general(&general));
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pet = PetRecord::new("p", species, Position::new(10.0, 10.0), &MoodConfig::default(), t0());
        machine.begin(&mut pet, t0(), &mut rng).expect("begin");

        let mut now = t0();
        for _ in 0..600 {
            now += Duration::milliseconds(250);
            machine.tick(&mut pet, now, 0.25, &mut rng).expect("tick");
            prop_assert!(species.supports(pet.state));
            prop_assert!(pet.position.x >= 0.0 && pet.position.x <= machine.area().max_x);
            prop_assert!(pet.position.y >= 0.0 && pet.position.y <= machine.area().max_y);
        }
    }
}
