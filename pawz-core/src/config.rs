//! Configuration for the pawz desktop pet system.
//!
//! Maps directly to `pawz.toml`. Every section and field is optional; missing
//! values fall back to the tuning shipped with the original sprite set.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{PawzError, Result};
use crate::types::Mood;

/// Top-level pawz configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PawzConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Mood bounds and time-driven mood rules.
    #[serde(default)]
    pub mood: MoodConfig,
    /// Behavior state machine tuning.
    #[serde(default)]
    pub behavior: BehaviorConfig,
    /// Animation frame timing.
    #[serde(default)]
    pub animation: AnimationConfig,
    /// Save file location and cadence.
    #[serde(default)]
    pub persistence: PersistenceConfig,
    /// Chat collaborator settings.
    #[serde(default)]
    pub chat: ChatConfig,
}

impl PawzConfig {
    /// Load configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `PawzError::Config` if the TOML is invalid or fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| PawzError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    /// Returns `PawzError::Config` naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        self.mood.validate()?;
        self.behavior.validate()?;
        self.animation.validate()?;

        if self.persistence.autosave_interval_seconds == 0 {
            return Err(invalid("persistence.autosave_interval_seconds must be > 0"));
        }
        if self.persistence.file_name.trim().is_empty() {
            return Err(invalid("persistence.file_name must not be empty"));
        }
        if self.chat.request_timeout_ms == 0 {
            return Err(invalid("chat.request_timeout_ms must be > 0"));
        }
        if !matches!(self.general.log_format.as_str(), "pretty" | "json") {
            return Err(invalid("general.log_format must be \"pretty\" or \"json\""));
        }
        if self.general.frame_rate_hz == 0 {
            return Err(invalid("general.frame_rate_hz must be > 0"));
        }
        if self.general.min_zoom <= 0.0 || self.general.min_zoom > self.general.max_zoom {
            return Err(invalid("general.min_zoom must be > 0 and <= general.max_zoom"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> PawzError {
    PawzError::Config(msg.to_string())
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General system settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log output: "pretty" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Screen width pets roam within, in pixels.
    #[serde(default = "default_screen_width")]
    pub screen_width: f32,
    /// Screen height pets roam within, in pixels.
    #[serde(default = "default_screen_height")]
    pub screen_height: f32,
    /// Edge length of one sprite frame in the sheet, in pixels.
    #[serde(default = "default_sprite_size")]
    pub sprite_size: u32,
    /// Initial render scale.
    #[serde(default = "default_scale")]
    pub scale_factor: f32,
    /// Smallest zoom the UI may request.
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f32,
    /// Largest zoom the UI may request.
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f32,
    /// Frame ticks per second driven by the host loop.
    #[serde(default = "default_frame_rate")]
    pub frame_rate_hz: u32,
}

impl GeneralConfig {
    /// On-screen edge length of a pet at the initial scale.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn scaled_sprite_size(&self) -> f32 {
        self.sprite_size as f32 * self.scale_factor
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            screen_width: 1920.0,
            screen_height: 1080.0,
            sprite_size: 16,
            scale_factor: 4.0,
            min_zoom: 1.0,
            max_zoom: 8.0,
            frame_rate_hz: 30,
        }
    }
}

/// Mood bounds and the time-driven mood rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodConfig {
    /// Mood of a freshly adopted pet.
    #[serde(default = "default_initial_mood")]
    pub initial: u8,
    /// Floor for every mood mutation.
    #[serde(default = "default_min_mood")]
    pub min: u8,
    /// Ceiling for every mood mutation.
    #[serde(default = "default_max_mood")]
    pub max: u8,
    /// Mood gained per click.
    #[serde(default = "default_1_u8")]
    pub pet_increase: u8,
    /// Mood lost per elapsed hour.
    #[serde(default = "default_1_u8")]
    pub decay_per_hour: u8,
    /// Lower bound of the daily re-roll.
    #[serde(default = "default_reset_min")]
    pub reset_min: u8,
    /// Upper bound of the daily re-roll.
    #[serde(default = "default_reset_max")]
    pub reset_max: u8,
}

impl MoodConfig {
    fn validate(&self) -> Result<()> {
        if self.max > Mood::MAX {
            return Err(invalid("mood.max must be <= 100"));
        }
        if self.min >= self.max {
            return Err(invalid("mood.min must be < mood.max"));
        }
        if !(self.min..=self.max).contains(&self.initial) {
            return Err(invalid("mood.initial must lie within [mood.min, mood.max]"));
        }
        if self.reset_min > self.reset_max
            || self.reset_min < self.min
            || self.reset_max > self.max
        {
            return Err(invalid("mood.reset_min..=reset_max must be a range inside [min, max]"));
        }
        Ok(())
    }
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            initial: 50,
            min: 0,
            max: 100,
            pet_increase: 1,
            decay_per_hour: 1,
            reset_min: 40,
            reset_max: 60,
        }
    }
}

/// Bounded dwell range, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DwellRange {
    /// Shortest dwell.
    pub min_secs: f32,
    /// Longest dwell.
    pub max_secs: f32,
}

impl DwellRange {
    /// Create a range.
    #[must_use]
    pub fn new(min_secs: f32, max_secs: f32) -> Self {
        Self { min_secs, max_secs }
    }

    fn is_valid(&self) -> bool {
        self.min_secs.is_finite()
            && self.max_secs.is_finite()
            && self.min_secs >= 0.0
            && self.min_secs <= self.max_secs
    }
}

/// Relative weights for leaving STAND.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionWeights {
    /// Weight of STAND -> WALK.
    #[serde(default = "default_walk_weight")]
    pub walk: f32,
    /// Weight of STAND -> SIT.
    #[serde(default = "default_sit_weight")]
    pub sit: f32,
    /// Weight of STAND -> EAT.
    #[serde(default = "default_eat_weight")]
    pub eat: f32,
}

impl Default for TransitionWeights {
    fn default() -> Self {
        Self {
            walk: 4.0,
            sit: 4.0,
            eat: 1.0,
        }
    }
}

/// Behavior state machine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// How long a pet stands before picking something to do.
    #[serde(default = "default_stand_dwell")]
    pub stand_dwell: DwellRange,
    /// How long a pet stays seated.
    #[serde(default = "default_sit_dwell")]
    pub sit_dwell: DwellRange,
    /// How long a pet keeps eating.
    #[serde(default = "default_eat_dwell")]
    pub eat_dwell: DwellRange,
    /// Weights for the state chosen after STAND.
    #[serde(default)]
    pub weights: TransitionWeights,
    /// Walking speed in pixels per second.
    #[serde(default = "default_walk_speed")]
    pub walk_speed: f32,
    /// Distance below which a walk target counts as reached, in pixels.
    #[serde(default = "default_arrival_epsilon")]
    pub arrival_epsilon: f32,
}

impl BehaviorConfig {
    fn validate(&self) -> Result<()> {
        for (name, range) in [
            ("behavior.stand_dwell", &self.stand_dwell),
            ("behavior.sit_dwell", &self.sit_dwell),
            ("behavior.eat_dwell", &self.eat_dwell),
        ] {
            if !range.is_valid() {
                return Err(PawzError::Config(format!(
                    "{name} must satisfy 0 <= min_secs <= max_secs"
                )));
            }
        }
        let w = &self.weights;
        if [w.walk, w.sit, w.eat].iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(invalid("behavior.weights must be finite and non-negative"));
        }
        if w.walk + w.sit + w.eat <= 0.0 {
            return Err(invalid("behavior.weights must not all be zero"));
        }
        if self.walk_speed <= 0.0 || !self.walk_speed.is_finite() {
            return Err(invalid("behavior.walk_speed must be > 0"));
        }
        if self.arrival_epsilon <= 0.0 {
            return Err(invalid("behavior.arrival_epsilon must be > 0"));
        }
        Ok(())
    }
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            stand_dwell: default_stand_dwell(),
            sit_dwell: default_sit_dwell(),
            eat_dwell: default_eat_dwell(),
            weights: TransitionWeights::default(),
            walk_speed: 40.0,
            arrival_epsilon: 1.0,
        }
    }
}

/// Seconds each frame stays on screen, per clip kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Standing frame duration.
    #[serde(default = "default_stand_frame")]
    pub stand_frame_secs: f32,
    /// Walking frame duration.
    #[serde(default = "default_walk_frame")]
    pub walk_frame_secs: f32,
    /// Sitting frame duration.
    #[serde(default = "default_sit_frame")]
    pub sit_frame_secs: f32,
    /// Eating frame duration.
    #[serde(default = "default_eat_frame")]
    pub eat_frame_secs: f32,
    /// Emote frame duration.
    #[serde(default = "default_emote_frame")]
    pub emote_frame_secs: f32,
    /// How many times the emote row loops between enter and exit.
    #[serde(default = "default_emote_repeats")]
    pub emote_repeats: u32,
}

impl AnimationConfig {
    fn validate(&self) -> Result<()> {
        let durations = [
            self.stand_frame_secs,
            self.walk_frame_secs,
            self.sit_frame_secs,
            self.eat_frame_secs,
            self.emote_frame_secs,
        ];
        if durations.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(invalid("animation frame durations must be > 0"));
        }
        Ok(())
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            stand_frame_secs: 0.1,
            walk_frame_secs: 0.25,
            sit_frame_secs: 0.3,
            eat_frame_secs: 0.2,
            emote_frame_secs: 0.15,
            emote_repeats: 3,
        }
    }
}

/// Save file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Directory holding the save file and its backup.
    #[serde(default = "default_save_dir")]
    pub save_dir: PathBuf,
    /// Primary save file name.
    #[serde(default = "default_file_name")]
    pub file_name: String,
    /// Autosave interval in seconds.
    #[serde(default = "default_autosave")]
    pub autosave_interval_seconds: u64,
    /// Detect save corruption via checksums.
    #[serde(default = "default_true")]
    pub checksum_enabled: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            file_name: default_file_name(),
            autosave_interval_seconds: 60,
            checksum_enabled: true,
        }
    }
}

/// Chat collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Provider: "none", "ollama" or "openai".
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Base URL for the model API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name.
    #[serde(default = "default_model")]
    pub model: String,
    /// API key for OpenAI-compatible providers.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Hard timeout for a reply, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    /// HTTP retries before giving up on the model.
    #[serde(default = "default_1_u32")]
    pub max_retries: u32,
    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// How many past conversation summaries go into the prompt.
    #[serde(default = "default_history")]
    pub history_in_prompt: usize,
    /// Optional TOML file replacing the built-in persona prompt.
    #[serde(default)]
    pub prompt_file: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: "none".to_string(),
            base_url: "http://localhost:11434".to_string(),
            model: "qwen2.5:1.5b".to_string(),
            api_key: None,
            request_timeout_ms: 10_000,
            max_retries: 1,
            max_tokens: 150,
            temperature: 0.7,
            history_in_prompt: 5,
            prompt_file: None,
        }
    }
}

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "pretty".to_string() }
fn default_screen_width() -> f32 { 1920.0 }
fn default_screen_height() -> f32 { 1080.0 }
fn default_sprite_size() -> u32 { 16 }
fn default_scale() -> f32 { 4.0 }
fn default_min_zoom() -> f32 { 1.0 }
fn default_max_zoom() -> f32 { 8.0 }
fn default_frame_rate() -> u32 { 30 }
fn default_initial_mood() -> u8 { 50 }
fn default_min_mood() -> u8 { 0 }
fn default_max_mood() -> u8 { 100 }
fn default_1_u8() -> u8 { 1 }
fn default_reset_min() -> u8 { 40 }
fn default_reset_max() -> u8 { 60 }
fn default_stand_dwell() -> DwellRange { DwellRange::new(3.0, 8.0) }
fn default_sit_dwell() -> DwellRange { DwellRange::new(4.0, 10.0) }
fn default_eat_dwell() -> DwellRange { DwellRange::new(3.0, 6.0) }
fn default_walk_weight() -> f32 { 4.0 }
fn default_sit_weight() -> f32 { 4.0 }
fn default_eat_weight() -> f32 { 1.0 }
fn default_walk_speed() -> f32 { 40.0 }
fn default_arrival_epsilon() -> f32 { 1.0 }
fn default_stand_frame() -> f32 { 0.1 }
fn default_walk_frame() -> f32 { 0.25 }
fn default_sit_frame() -> f32 { 0.3 }
fn default_eat_frame() -> f32 { 0.2 }
fn default_emote_frame() -> f32 { 0.15 }
fn default_emote_repeats() -> u32 { 3 }
fn default_save_dir() -> PathBuf { PathBuf::from("pet_saves") }
fn default_file_name() -> String { "pets_data.json".to_string() }
fn default_autosave() -> u64 { 60 }
fn default_provider() -> String { "none".to_string() }
fn default_base_url() -> String { "http://localhost:11434".to_string() }
fn default_model() -> String { "qwen2.5:1.5b".to_string() }
fn default_timeout_ms() -> u64 { 10_000 }
fn default_1_u32() -> u32 { 1 }
fn default_max_tokens() -> u32 { 150 }
fn default_temperature() -> f32 { 0.7 }
fn default_history() -> usize { 5 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        PawzConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PawzConfig::from_toml("").expect("parse");
        assert_eq!(config.mood.initial, 50);
        assert_eq!(config.persistence.file_name, "pets_data.json");
        assert_eq!(config.persistence.autosave_interval_seconds, 60);
        assert_eq!(config.chat.provider, "none");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = PawzConfig::from_toml(
            r#"
            [mood]
            initial = 70

            [behavior]
            walk_speed = 12.5
            stand_dwell = { min_secs = 1.0, max_secs = 2.0 }

            [chat]
            provider = "ollama"
            request_timeout_ms = 2500
            "#,
        )
        .expect("parse");
        assert_eq!(config.mood.initial, 70);
        assert_eq!(config.mood.reset_max, 60);
        assert!((config.behavior.walk_speed - 12.5).abs() < f32::EPSILON);
        assert!((config.behavior.stand_dwell.max_secs - 2.0).abs() < f32::EPSILON);
        assert!((config.behavior.weights.walk - 4.0).abs() < f32::EPSILON);
        assert_eq!(config.chat.request_timeout_ms, 2500);
    }

    #[test]
    fn rejects_inverted_mood_bounds() {
        let err = PawzConfig::from_toml("[mood]\nmin = 80\nmax = 20\ninitial = 50\n")
            .expect_err("should fail");
        assert!(matches!(err, PawzError::Config(_)));
    }

    #[test]
    fn rejects_initial_outside_bounds() {
        let mut config = PawzConfig::default();
        config.mood.initial = 0;
        config.mood.min = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_weights_and_bad_frames() {
        let mut config = PawzConfig::default();
        config.behavior.weights = TransitionWeights {
            walk: 0.0,
            sit: 0.0,
            eat: 0.0,
        };
        assert!(config.validate().is_err());

        let mut config = PawzConfig::default();
        config.animation.emote_frame_secs = 0.0;
        assert!(config.validate().is_err());

        let mut config = PawzConfig::default();
        config.behavior.sit_dwell = DwellRange::new(5.0, 1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(PawzConfig::from_toml("[mood\ninitial = ").is_err());
    }
}
