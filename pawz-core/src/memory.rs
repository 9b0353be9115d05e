//! Per-pet memory: interaction counters, living time and chat summaries.
//!
//! A [`MemoryLog`] is owned by its [`PetRecord`](crate::pet::PetRecord) and
//! persisted in full. Its counters only ever grow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only record of a pet's interactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryLog {
    /// How many times the pet has been clicked.
    #[serde(default)]
    pub times_petted: u64,
    /// Wall-clock seconds the pet has existed, including offline time.
    #[serde(default)]
    pub total_living_seconds: f64,
    /// One short entry per chat exchange, oldest first.
    #[serde(default)]
    pub conversation_summaries: Vec<String>,
    /// Last instant living time was credited up to. Not persisted; the
    /// save timestamp plays this role on disk.
    #[serde(skip)]
    living_checkpoint: Option<DateTime<Utc>>,
}

impl MemoryLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one petting. Returns the new total.
    pub fn record_petting(&mut self) -> u64 {
        self.times_petted = self.times_petted.saturating_add(1);
        self.times_petted
    }

    /// Append a conversation summary. Blank summaries are ignored.
    pub fn append_summary(&mut self, summary: impl Into<String>) {
        let summary = summary.into();
        let trimmed = summary.trim();
        if !trimmed.is_empty() {
            self.conversation_summaries.push(trimmed.to_string());
        }
    }

    /// Number of recorded conversations.
    #[must_use]
    pub fn conversation_count(&self) -> usize {
        self.conversation_summaries.len()
    }

    /// The `n` most recent summaries, oldest first.
    #[must_use]
    pub fn recent_summaries(&self, n: usize) -> &[String] {
        let start = self.conversation_summaries.len().saturating_sub(n);
        &self.conversation_summaries[start..]
    }

    /// Credit `seconds` of living time. Negative or non-finite values are
    /// ignored so the total stays monotonic.
    pub fn add_living_seconds(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds > 0.0 {
            self.total_living_seconds += seconds;
        }
    }

    /// Start counting living time from `now` without crediting anything.
    pub fn set_living_checkpoint(&mut self, now: DateTime<Utc>) {
        self.living_checkpoint = Some(now);
    }

    /// Credit the wall-clock gap since the last checkpoint and move the
    /// checkpoint to `now`. Returns the seconds credited.
    ///
    /// A clock that went backwards credits nothing but still resets the
    /// checkpoint.
    pub fn advance_living_time(&mut self, now: DateTime<Utc>) -> f64 {
        let credited = match self.living_checkpoint {
            Some(prev) => seconds_between(prev, now),
            None => 0.0,
        };
        self.add_living_seconds(credited);
        self.living_checkpoint = Some(now);
        credited
    }
}

/// Non-negative seconds from `earlier` to `later`.
#[must_use]
pub fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    let delta = later.signed_duration_since(earlier);
    // Millisecond precision is plenty for living time.
    #[allow(clippy::cast_precision_loss)]
    let secs = delta.num_milliseconds() as f64 / 1000.0;
    secs.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).single().expect("valid time")
    }

    #[test]
    fn petting_counts_up() {
        let mut log = MemoryLog::new();
        assert_eq!(log.record_petting(), 1);
        assert_eq!(log.record_petting(), 2);
        assert_eq!(log.times_petted, 2);
    }

    #[test]
    fn summaries_keep_insertion_order() {
        let mut log = MemoryLog::new();
        log.append_summary("first");
        log.append_summary("   ");
        log.append_summary("second");
        log.append_summary("third");
        assert_eq!(log.conversation_count(), 3);
        assert_eq!(log.recent_summaries(2), ["second", "third"]);
        assert_eq!(log.recent_summaries(10).len(), 3);
    }

    #[test]
    fn living_time_ignores_negative_gaps() {
        let mut log = MemoryLog::new();
        log.add_living_seconds(-10.0);
        log.add_living_seconds(f64::NAN);
        assert!(log.total_living_seconds.abs() < f64::EPSILON);
    }

    #[test]
    fn advance_credits_gap_since_checkpoint() {
        let mut log = MemoryLog::new();
        assert!(log.advance_living_time(t0()).abs() < f64::EPSILON);
        let credited = log.advance_living_time(t0() + Duration::seconds(90));
        assert!((credited - 90.0).abs() < 1e-9);
        // Clock went backwards: nothing credited.
        let credited = log.advance_living_time(t0());
        assert!(credited.abs() < f64::EPSILON);
        assert!((log.total_living_seconds - 90.0).abs() < 1e-9);
    }
}
