//! Sprite-sheet metadata.
//!
//! The core never touches pixels. It only needs to know, per species, which
//! frames of the base sheet make up each (state, facing) clip, and the shape
//! of the shared emote sheet.
//!
//! Base sheets are 4 columns wide; frame `n` sits at row `n / 4`, column `n % 4`:
//!
//! ```text
//! row 0  walk down    0  1  2  3
//! row 1  walk right   4  5  6  7
//! row 2  walk up      8  9 10 11
//! row 3  walk left   12 13 14 15
//! row 4  sit down/right     16 17 | 18 19
//! row 5  sit up/left        20 21 | 22 23
//! row 6  eat         24 25 26 27
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{BehaviorState, Direction, Species};

/// Columns in every base sheet.
pub const BASE_COLUMNS: usize = 4;
/// Rows in the emote sheet.
pub const EMOTE_ROWS: usize = 16;
/// Columns in the emote sheet.
pub const EMOTE_COLUMNS: usize = 4;

/// How a clip behaves once its last frame is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Wrap back to the first frame.
    Loop,
    /// Hold the last frame.
    Once,
}

/// A contiguous run of frames on one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clip {
    /// Sheet row.
    pub row: usize,
    /// First column on that row.
    pub column: usize,
    /// Number of frames.
    pub frame_count: usize,
    /// Loop or hold.
    pub playback: Playback,
}

impl Clip {
    const fn looping(row: usize, column: usize, frame_count: usize) -> Self {
        Self {
            row,
            column,
            frame_count,
            playback: Playback::Loop,
        }
    }

    const fn once(row: usize, column: usize, frame_count: usize) -> Self {
        Self {
            row,
            column,
            frame_count,
            playback: Playback::Once,
        }
    }

    /// Sheet index of the first frame.
    #[must_use]
    pub fn first_frame(&self) -> usize {
        self.row * BASE_COLUMNS + self.column
    }

    /// Sheet index of the `step`-th frame, honoring the playback mode.
    #[must_use]
    pub fn frame_at(&self, step: usize) -> usize {
        let count = self.frame_count.max(1);
        let offset = match self.playback {
            Playback::Loop => step % count,
            Playback::Once => step.min(count - 1),
        };
        self.first_frame() + offset
    }
}

/// Per-species frame table.
#[derive(Debug)]
pub struct SpeciesSheet {
    /// Image file name of the base sheet.
    pub image: &'static str,
    /// Walk clips indexed by [`direction_slot`].
    walk: [Clip; 4],
    /// Sit-down clips indexed by [`direction_slot`], if the species sits.
    sit: Option<[Clip; 4]>,
    /// Eating clip, if the species eats.
    eat: Option<Clip>,
}

const WALK: [Clip; 4] = [
    Clip::looping(0, 0, 4),
    Clip::looping(1, 0, 4),
    Clip::looping(2, 0, 4),
    Clip::looping(3, 0, 4),
];

const SIT: [Clip; 4] = [
    Clip::once(4, 0, 2),
    Clip::once(4, 2, 2),
    Clip::once(5, 0, 2),
    Clip::once(5, 2, 2),
];

const EAT: Clip = Clip::looping(6, 0, 4);

static CHICKEN: SpeciesSheet = SpeciesSheet {
    image: "chicken.png",
    walk: WALK,
    sit: Some(SIT),
    eat: Some(EAT),
};

static CAT: SpeciesSheet = SpeciesSheet {
    image: "cat.png",
    walk: WALK,
    sit: Some(SIT),
    eat: Some(EAT),
};

static DOG: SpeciesSheet = SpeciesSheet {
    image: "dog.png",
    walk: WALK,
    sit: Some(SIT),
    eat: Some(EAT),
};

static DUCK: SpeciesSheet = SpeciesSheet {
    image: "duck.png",
    walk: WALK,
    sit: None,
    eat: Some(EAT),
};

/// Frame table for a species.
#[must_use]
pub fn sheet(species: Species) -> &'static SpeciesSheet {
    match species {
        Species::Chicken => &CHICKEN,
        Species::Cat => &CAT,
        Species::Dog => &DOG,
        Species::Duck => &DUCK,
    }
}

fn direction_slot(direction: Direction) -> usize {
    match direction {
        Direction::Down => 0,
        Direction::Right => 1,
        Direction::Up => 2,
        Direction::Left => 3,
    }
}

impl SpeciesSheet {
    /// The clip for `state` while facing `direction`, or `None` if this
    /// sheet has no frames for the state.
    #[must_use]
    pub fn clip(&self, state: BehaviorState, direction: Direction) -> Option<Clip> {
        let slot = direction_slot(direction);
        match state {
            BehaviorState::Stand => {
                let walk = self.walk[slot];
                Some(Clip::once(walk.row, walk.column, 1))
            }
            BehaviorState::Walk => Some(self.walk[slot]),
            BehaviorState::Sit => self.sit.map(|clips| clips[slot]),
            BehaviorState::Eat => self.eat,
        }
    }
}

// ---------------------------------------------------------------------------
// Emotes
// ---------------------------------------------------------------------------

/// Emotes available on the shared emote sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emote {
    /// Question marks.
    Confused,
    /// Steam.
    Angry,
    /// Exclamation mark.
    Important,
    /// Hearts.
    Love,
    /// Zzz.
    Sleepy,
    /// Tear.
    Sad,
    /// Smile.
    Happy,
    /// Ellipsis.
    Speechless,
}

/// Row of the pop-up bubble played before and after every emote.
pub const EMOTE_BUBBLE_ROW: usize = 0;

impl Emote {
    /// Row on the emote sheet.
    #[must_use]
    pub fn row(self) -> usize {
        match self {
            Self::Confused => 2,
            Self::Angry => 3,
            Self::Important => 4,
            Self::Love => 5,
            Self::Sleepy => 6,
            Self::Sad => 7,
            Self::Happy => 8,
            Self::Speechless => 10,
        }
    }

    /// Full emote-sheet frame sequence: bubble opens, the emote row plays
    /// `repeats` times, bubble closes.
    #[must_use]
    pub fn sequence(self, repeats: u32) -> Vec<usize> {
        let bubble = EMOTE_BUBBLE_ROW * EMOTE_COLUMNS;
        let row = self.row() * EMOTE_COLUMNS;
        let mut frames: Vec<usize> = (bubble..bubble + EMOTE_COLUMNS).collect();
        for _ in 0..repeats {
            frames.extend(row..row + EMOTE_COLUMNS);
        }
        frames.extend((bubble..bubble + EMOTE_COLUMNS).rev());
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_rows_follow_facing() {
        let s = sheet(Species::Chicken);
        let down = s.clip(BehaviorState::Walk, Direction::Down).expect("walk");
        let left = s.clip(BehaviorState::Walk, Direction::Left).expect("walk");
        assert_eq!(down.first_frame(), 0);
        assert_eq!(left.first_frame(), 12);
        assert_eq!(left.frame_at(5), 13);
    }

    #[test]
    fn sit_plays_once_and_holds() {
        let s = sheet(Species::Cat);
        let up = s.clip(BehaviorState::Sit, Direction::Up).expect("sit");
        assert_eq!(up.first_frame(), 20);
        assert_eq!(up.frame_at(0), 20);
        assert_eq!(up.frame_at(1), 21);
        assert_eq!(up.frame_at(9), 21);
        let right = s.clip(BehaviorState::Sit, Direction::Right).expect("sit");
        assert_eq!(right.first_frame(), 18);
    }

    #[test]
    fn eat_and_stand_frames() {
        let s = sheet(Species::Dog);
        assert_eq!(s.clip(BehaviorState::Eat, Direction::Left).expect("eat").first_frame(), 24);
        let stand = s.clip(BehaviorState::Stand, Direction::Right).expect("stand");
        assert_eq!(stand.frame_count, 1);
        assert_eq!(stand.first_frame(), 4);
    }

    #[test]
    fn sheet_matches_species_state_set() {
        for species in Species::ALL {
            let s = sheet(species);
            for state in [
                BehaviorState::Stand,
                BehaviorState::Walk,
                BehaviorState::Sit,
                BehaviorState::Eat,
            ] {
                assert_eq!(
                    s.clip(state, Direction::Down).is_some(),
                    species.supports(state),
                    "{species} / {state}"
                );
            }
        }
    }

    #[test]
    fn emote_sequence_shape() {
        let frames = Emote::Happy.sequence(3);
        assert_eq!(frames.len(), 4 + 3 * 4 + 4);
        assert_eq!(&frames[..4], &[0, 1, 2, 3]);
        assert_eq!(&frames[4..8], &[32, 33, 34, 35]);
        assert_eq!(&frames[frames.len() - 4..], &[3, 2, 1, 0]);
        assert!(frames.iter().all(|f| *f < EMOTE_ROWS * EMOTE_COLUMNS));
    }
}
