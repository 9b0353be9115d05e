//! Frame bookkeeping for the base animation and the emote overlay.
//!
//! The driver accumulates `dt` and steps a clip whenever a whole frame
//! duration has elapsed, so animation speed does not depend on the tick rate.
//! A change of clip (new state or new facing) restarts at the clip's first
//! frame. Emotes run on their own cursor on top of the base animation and
//! disappear once their sequence ends.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::AnimationConfig;
use crate::error::{PawzError, Result};
use crate::pet::PetRecord;
use crate::sprites::{self, Emote, Playback};
use crate::types::{BehaviorState, Direction, Mood};

/// Per-pet animation cursor. Runtime only.
#[derive(Debug, Clone, Default)]
pub struct AnimationState {
    clip: Option<(BehaviorState, Direction)>,
    step: usize,
    elapsed: f32,
    emote: Option<EmoteOverlay>,
}

impl AnimationState {
    /// The emote currently playing, if any.
    #[must_use]
    pub fn active_emote(&self) -> Option<Emote> {
        self.emote.as_ref().map(|o| o.emote)
    }
}

/// A transient emote playing over the base animation.
#[derive(Debug, Clone)]
struct EmoteOverlay {
    emote: Emote,
    frames: Vec<usize>,
    cursor: usize,
    elapsed: f32,
}

/// What the renderer should draw for one pet this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedFrame {
    /// Frame index in the species' base sheet.
    pub base: usize,
    /// Frame index in the emote sheet, while an emote is active.
    pub emote: Option<usize>,
}

/// Advances animation cursors.
#[derive(Debug, Clone)]
pub struct AnimationDriver {
    config: AnimationConfig,
}

impl AnimationDriver {
    /// Create a driver with the given frame timings.
    #[must_use]
    pub fn new(config: AnimationConfig) -> Self {
        Self { config }
    }

    /// Seconds each base frame of `state` stays on screen.
    #[must_use]
    pub fn frame_secs(&self, state: BehaviorState) -> f32 {
        match state {
            BehaviorState::Stand => self.config.stand_frame_secs,
            BehaviorState::Walk => self.config.walk_frame_secs,
            BehaviorState::Sit => self.config.sit_frame_secs,
            BehaviorState::Eat => self.config.eat_frame_secs,
        }
    }

    /// Advance `pet` by `dt` seconds, update [`PetRecord::frame_index`] and
    /// return the frames to draw.
    ///
    /// # Errors
    /// Returns [`PawzError::InvalidState`] if the species' sheet has no clip
    /// for the pet's state.
    pub fn advance(&self, pet: &mut PetRecord, dt: f32) -> Result<RenderedFrame> {
        let key = (pet.state, pet.direction);
        let clip = sprites::sheet(pet.species)
            .clip(pet.state, pet.direction)
            .ok_or(PawzError::InvalidState {
                species: pet.species,
                state: pet.state,
            })?;

        let frame_secs = self.frame_secs(pet.state);
        let anim = &mut pet.runtime.animation;
        if anim.clip == Some(key) {
            let steps = consume_steps(&mut anim.elapsed, dt, frame_secs);
            let count = clip.frame_count.max(1);
            anim.step = match clip.playback {
                Playback::Loop => (anim.step % count + steps % count) % count,
                Playback::Once => anim.step.saturating_add(steps).min(count - 1),
            };
        } else {
            anim.clip = Some(key);
            anim.step = 0;
            anim.elapsed = 0.0;
        }
        pet.frame_index = clip.frame_at(anim.step);

        let emote_frame = self.advance_emote(anim, dt);
        Ok(RenderedFrame {
            base: pet.frame_index,
            emote: emote_frame,
        })
    }

    fn advance_emote(&self, anim: &mut AnimationState, dt: f32) -> Option<usize> {
        let overlay = anim.emote.as_mut()?;
        let steps = consume_steps(&mut overlay.elapsed, dt, self.config.emote_frame_secs);
        overlay.cursor = overlay.cursor.saturating_add(steps);
        if let Some(&frame) = overlay.frames.get(overlay.cursor) {
            Some(frame)
        } else {
            anim.emote = None;
            None
        }
    }

    /// Start `emote` over the base animation, replacing any active one.
    pub fn start_emote(&self, pet: &mut PetRecord, emote: Emote) {
        pet.runtime.animation.emote = Some(EmoteOverlay {
            emote,
            frames: emote.sequence(self.config.emote_repeats),
            cursor: 0,
            elapsed: 0.0,
        });
    }

    /// Total on-screen time of one emote, in seconds.
    #[must_use]
    pub fn emote_duration_secs(&self) -> f32 {
        let frames = Emote::Happy.sequence(self.config.emote_repeats).len();
        #[allow(clippy::cast_precision_loss)]
        let secs = frames as f32 * self.config.emote_frame_secs;
        secs
    }
}

/// Add `dt` to `elapsed` and return how many whole frames fit, keeping the remainder.
fn consume_steps(elapsed: &mut f32, dt: f32, frame_secs: f32) -> usize {
    if dt.is_finite() && dt > 0.0 {
        *elapsed += dt;
    }
    if frame_secs <= 0.0 || *elapsed < frame_secs {
        return 0;
    }
    let steps = (*elapsed / frame_secs).floor();
    let rest = *elapsed - steps * frame_secs;
    *elapsed = if rest.is_finite() { rest.clamp(0.0, frame_secs) } else { 0.0 };
    // Float-to-int casts saturate, so a huge dt yields usize::MAX at worst.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let steps = steps as usize;
    steps
}

/// Pick a click emote for `mood`: cheerful when high, grumpy when low.
pub fn choose_emote<R: Rng + ?Sized>(mood: Mood, rng: &mut R) -> Emote {
    const HIGH: &[Emote] = &[Emote::Happy, Emote::Love, Emote::Important, Emote::Sleepy];
    const LOW: &[Emote] = &[
        Emote::Angry,
        Emote::Sad,
        Emote::Confused,
        Emote::Speechless,
        Emote::Sleepy,
    ];
    const MEDIUM: &[Emote] = &[
        Emote::Confused,
        Emote::Angry,
        Emote::Important,
        Emote::Sleepy,
        Emote::Speechless,
    ];

    let pool = if mood.value() >= 75 {
        HIGH
    } else if mood.value() <= 50 {
        LOW
    } else {
        MEDIUM
    };
    pool.choose(rng).copied().unwrap_or(Emote::Confused)
}
