//! JSON save file for every pet, with a single backup and crash-safe writes.
//!
//! On-disk layout (`<save_dir>/pets_data.json` by default):
//!
//! ```json
//! {
//!   "version": 2,
//!   "saved_at": "2024-05-01T09:00:00Z",
//!   "checksum": "1c291ca3",
//!   "pets": {
//!     "<uuid>": { "name": "Clucky", "species": "chicken", "position": {"x": 0, "y": 0},
//!                 "mood": 50, "state": "STAND", "memory": { ... }, ... }
//!   }
//! }
//! ```
//!
//! Write path: the current primary (only if it still verifies) is copied to
//! `<file>.backup`, the new contents go to `<file>.tmp`, and the temporary
//! file is renamed over the primary. A crash at any point leaves either the
//! old or the new primary intact, never a partial one.
//!
//! Read path: primary, then backup, then an empty registry. A file fails
//! verification when it is unparseable, its CRC-32 over `saved_at` and the
//! pets does not match, it comes from a newer format version, or it holds an
//! invalid species/state pair.
//! Time between `saved_at` and the load is credited to every pet's living time.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::PersistenceConfig;
use crate::error::{PawzError, Result};
use crate::memory::seconds_between;
use crate::pet::PetRecord;
use crate::types::PetId;

/// Current save format version. Version 1 checksummed the pets only;
/// version 2 also covers `saved_at`.
pub const SAVE_FORMAT_VERSION: u32 = 2;

// ---------------------------------------------------------------------------
// CRC-32 checksum helper
// ---------------------------------------------------------------------------

/// CRC-32 (ISO-HDLC) of `data` as lowercase hex.
fn crc32_hex(data: &[u8]) -> String {
    format!("{:08x}", crc32_compute(data))
}

/// Bitwise CRC-32 with the reflected 0xEDB88320 polynomial.
fn crc32_compute(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ POLY } else { crc >> 1 };
        }
    }
    !crc
}

/// Checksum of the envelope fields that carry data, as written by `version`.
fn envelope_checksum(version: u32, saved_at: DateTime<Utc>, pets: &serde_json::Value) -> Result<String> {
    let canonical = if version < 2 {
        serde_json::to_vec(pets)
    } else {
        serde_json::to_vec(&(saved_at, pets))
    }
    .map_err(|e| PawzError::Serialization(e.to_string()))?;
    Ok(crc32_hex(&canonical))
}

// ---------------------------------------------------------------------------
// File envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SaveEnvelope {
    version: u32,
    saved_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    checksum: Option<String>,
    /// Kept as a JSON value so the checksum covers a canonical encoding.
    pets: serde_json::Value,
}

/// A verified save file.
#[derive(Debug)]
struct SaveContents {
    saved_at: DateTime<Utc>,
    pets: BTreeMap<PetId, PetRecord>,
}

/// Where a load found its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// The primary save file.
    Primary,
    /// The backup, because the primary was missing or corrupt.
    Backup,
    /// Nothing usable on disk; first run.
    Fresh,
}

/// Result of [`PersistenceManager::load`].
#[derive(Debug)]
pub struct LoadOutcome {
    /// Restored pets, ordered by ID.
    pub pets: Vec<PetRecord>,
    /// Which file they came from.
    pub source: LoadSource,
    /// Seconds between the save and the load, credited as living time.
    pub offline_secs: f64,
}

/// Summary of a completed save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    /// Number of pets written.
    pub pets: usize,
    /// Size of the primary file.
    pub bytes: usize,
    /// Whether the previous primary was rotated into the backup.
    pub rotated_backup: bool,
}

// ---------------------------------------------------------------------------
// PersistenceManager
// ---------------------------------------------------------------------------

/// Reads and writes the pet save file.
#[derive(Debug, Clone)]
pub struct PersistenceManager {
    config: PersistenceConfig,
    path: PathBuf,
    backup_path: PathBuf,
    tmp_path: PathBuf,
}

impl PersistenceManager {
    /// Manager for `<save_dir>/<file_name>`. Nothing is touched on disk until
    /// the first save.
    #[must_use]
    pub fn new(config: &PersistenceConfig) -> Self {
        let path = config.save_dir.join(&config.file_name);
        let backup_path = sibling(&path, "backup");
        let tmp_path = sibling(&path, "tmp");
        Self {
            config: config.clone(),
            path,
            backup_path,
            tmp_path,
        }
    }

    /// Primary save file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Single backup file.
    #[must_use]
    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    // ------------------------------------------------------------------
    // Save
    // ------------------------------------------------------------------

    /// Write every pet to the primary file.
    ///
    /// Callers should credit living time first (see
    /// [`checkpoint_living_time`]) so the snapshot and its `saved_at` agree.
    ///
    /// # Errors
    ///
    /// Returns [`PawzError::Serialization`] if encoding fails or
    /// [`PawzError::Io`] if the directory or files cannot be written. On
    /// error the previous primary is still in place.
    pub fn save<'a, I>(&self, pets: I, now: DateTime<Utc>) -> Result<SaveReport>
    where
        I: IntoIterator<Item = &'a PetRecord>,
    {
        let start = Instant::now();
        let pets: BTreeMap<PetId, &PetRecord> = pets.into_iter().map(|p| (p.id, p)).collect();
        let count = pets.len();
        let bytes = self.encode(&pets, now)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let rotated_backup = self.rotate_backup();
        write_atomic(&self.tmp_path, &self.path, &bytes)?;

        debug!(
            path = %self.path.display(),
            pets = count,
            bytes = bytes.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Saved pets"
        );

        Ok(SaveReport {
            pets: count,
            bytes: bytes.len(),
            rotated_backup,
        })
    }

    fn encode(&self, pets: &BTreeMap<PetId, &PetRecord>, now: DateTime<Utc>) -> Result<Vec<u8>> {
        let value = serde_json::to_value(pets).map_err(|e| PawzError::Serialization(e.to_string()))?;
        let checksum = if self.config.checksum_enabled {
            Some(envelope_checksum(SAVE_FORMAT_VERSION, now, &value)?)
        } else {
            None
        };
        let envelope = SaveEnvelope {
            version: SAVE_FORMAT_VERSION,
            saved_at: now,
            checksum,
            pets: value,
        };
        serde_json::to_vec_pretty(&envelope).map_err(|e| PawzError::Serialization(e.to_string()))
    }

    /// Copy the current primary over the backup, but only if it verifies, so
    /// a corrupt primary never clobbers a good backup.
    fn rotate_backup(&self) -> bool {
        if !self.path.exists() {
            return false;
        }
        if let Err(e) = self.read_file(&self.path) {
            warn!(error = %e, "Current save does not verify; keeping existing backup");
            return false;
        }
        match fs::copy(&self.path, &self.backup_path) {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, backup = %self.backup_path.display(), "Backup copy failed");
                false
            }
        }
    }

    /// Drop `id` from the backup so a later fallback cannot resurrect a
    /// removed pet. Returns `true` if the backup held that pet.
    ///
    /// # Errors
    ///
    /// Returns [`PawzError::Io`] or [`PawzError::Serialization`] if the
    /// backup verifies but cannot be rewritten.
    pub fn forget(&self, id: PetId) -> Result<bool> {
        let Ok(mut contents) = self.read_file(&self.backup_path) else {
            return Ok(false);
        };
        if contents.pets.remove(&id).is_none() {
            return Ok(false);
        }
        let pets: BTreeMap<PetId, &PetRecord> = contents.pets.iter().map(|(k, v)| (*k, v)).collect();
        let bytes = self.encode(&pets, contents.saved_at)?;
        write_atomic(&sibling(&self.backup_path, "tmp"), &self.backup_path, &bytes)?;
        debug!(pet = %id, "Removed pet from backup");
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Load
    // ------------------------------------------------------------------

    /// Restore pets: primary, else backup, else nothing.
    ///
    /// Never fails; unreadable files are logged and skipped. Every restored
    /// pet is credited with the time since its file was written and restarts
    /// its dwell timer at `now`.
    #[must_use]
    pub fn load(&self, now: DateTime<Utc>) -> LoadOutcome {
        let (contents, source) = match self.read_file(&self.path) {
            Ok(c) => (Some(c), LoadSource::Primary),
            Err(primary_err) => {
                if self.path.exists() {
                    warn!(error = %primary_err, path = %self.path.display(), "Primary save unusable; trying backup");
                }
                match self.read_file(&self.backup_path) {
                    Ok(c) => (Some(c), LoadSource::Backup),
                    Err(backup_err) => {
                        if self.backup_path.exists() {
                            warn!(error = %backup_err, path = %self.backup_path.display(), "Backup unusable; starting fresh");
                        }
                        (None, LoadSource::Fresh)
                    }
                }
            }
        };

        let Some(contents) = contents else {
            info!("No saved pets found");
            return LoadOutcome {
                pets: Vec::new(),
                source,
                offline_secs: 0.0,
            };
        };

        let offline_secs = seconds_between(contents.saved_at, now);
        let pets: Vec<PetRecord> = contents
            .pets
            .into_values()
            .map(|mut pet| {
                pet.memory.add_living_seconds(offline_secs);
                pet.memory.set_living_checkpoint(now);
                pet.state_entered_at = now;
                pet
            })
            .collect();

        info!(
            pets = pets.len(),
            source = ?source,
            offline_secs,
            "Loaded pets"
        );

        LoadOutcome {
            pets,
            source,
            offline_secs,
        }
    }

    /// Read and verify one save file.
    fn read_file(&self, path: &Path) -> Result<SaveContents> {
        let data = fs::read(path)?;
        let envelope: SaveEnvelope =
            serde_json::from_slice(&data).map_err(|e| PawzError::Persistence(e.to_string()))?;

        if envelope.version > SAVE_FORMAT_VERSION {
            return Err(PawzError::Persistence(format!(
                "save format {} is newer than supported {SAVE_FORMAT_VERSION}",
                envelope.version
            )));
        }

        if self.config.checksum_enabled {
            if let Some(ref expected) = envelope.checksum {
                let actual = envelope_checksum(envelope.version, envelope.saved_at, &envelope.pets)?;
                if *expected != actual {
                    return Err(PawzError::Persistence(format!(
                        "checksum mismatch (expected {expected}, got {actual})"
                    )));
                }
            }
        }

        let pets: BTreeMap<PetId, PetRecord> = serde_json::from_value(envelope.pets)
            .map_err(|e| PawzError::Persistence(e.to_string()))?;
        for (id, pet) in &pets {
            if *id != pet.id {
                return Err(PawzError::Persistence(format!(
                    "entry {id} holds pet {}",
                    pet.id
                )));
            }
            pet.validate()?;
        }

        Ok(SaveContents {
            saved_at: envelope.saved_at,
            pets,
        })
    }
}

/// Credit living time up to `now` for every pet, ahead of a save.
pub fn checkpoint_living_time<'a, I>(pets: I, now: DateTime<Utc>)
where
    I: IntoIterator<Item = &'a mut PetRecord>,
{
    for pet in pets {
        pet.memory.advance_living_time(now);
    }
}

/// `pets_data.json` -> `pets_data.json.<suffix>`.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

/// Write `bytes` to `tmp`, flush to disk, then rename over `dest`.
fn write_atomic(tmp: &Path, dest: &Path, bytes: &[u8]) -> Result<()> {
    {
        let mut file = fs::File::create(tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(tmp, dest)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MoodConfig;
    use crate::types::{BehaviorState, Mood, Position, Species};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).single().expect("valid time")
    }

    fn test_config(dir: &Path) -> PersistenceConfig {
        PersistenceConfig {
            save_dir: dir.to_path_buf(),
            ..PersistenceConfig::default()
        }
    }

    fn sample_pets() -> Vec<PetRecord> {
        let mut clucky = PetRecord::new("Clucky", Species::Chicken, Position::new(10.5, 20.25), &MoodConfig::default(), t0());
        clucky.mood = Mood::new(73);
        clucky.memory.times_petted = 12;
        clucky.memory.total_living_seconds = 3600.0;
        clucky.memory.append_summary("You said \"hi\"; Clucky replied \"Bawk!\"");
        clucky.state = BehaviorState::Sit;

        let whiskers = PetRecord::new("Whiskers", Species::Cat, Position::new(300.0, 400.0), &MoodConfig::default(), t0());
        vec![clucky, whiskers]
    }

    #[test]
    fn round_trip_save_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = PersistenceManager::new(&test_config(dir.path()));
        let pets = sample_pets();

        let report = manager.save(&pets, t0()).expect("save");
        assert_eq!(report.pets, 2);
        assert!(!report.rotated_backup);

        let outcome = manager.load(t0() + Duration::seconds(30));
        assert_eq!(outcome.source, LoadSource::Primary);
        assert_eq!(outcome.pets.len(), 2);
        let clucky = outcome.pets.iter().find(|p| p.name == "Clucky").expect("clucky");
        assert_eq!(clucky.species, Species::Chicken);
        assert_eq!(clucky.mood.value(), 73);
        assert_eq!(clucky.state, BehaviorState::Sit);
        assert_eq!(clucky.position, Position::new(10.5, 20.25));
        assert_eq!(clucky.memory.times_petted, 12);
        assert_eq!(clucky.memory.conversation_summaries, pets[0].memory.conversation_summaries);
        assert!((clucky.memory.total_living_seconds - 3630.0).abs() < 1e-6);
        assert!((outcome.offline_secs - 30.0).abs() < 1e-6);
    }

    #[test]
    fn missing_files_load_fresh() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = PersistenceManager::new(&test_config(&dir.path().join("nested")));
        let outcome = manager.load(t0());
        assert_eq!(outcome.source, LoadSource::Fresh);
        assert!(outcome.pets.is_empty());
    }

    #[test]
    fn second_save_rotates_backup_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = PersistenceManager::new(&test_config(dir.path()));
        let pets = sample_pets();

        manager.save(&pets, t0()).expect("save 1");
        let report = manager.save(&pets[..1], t0() + Duration::minutes(1)).expect("save 2");
        assert!(report.rotated_backup);
        assert!(manager.backup_path().exists());
        assert!(!dir.path().join("pets_data.json.tmp").exists());

        // The backup holds the first save (two pets).
        fs::remove_file(manager.path()).expect("remove primary");
        let outcome = manager.load(t0() + Duration::minutes(2));
        assert_eq!(outcome.source, LoadSource::Backup);
        assert_eq!(outcome.pets.len(), 2);
    }

    #[test]
    fn corrupt_primary_falls_back_to_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = PersistenceManager::new(&test_config(dir.path()));
        let pets = sample_pets();
        manager.save(&pets, t0()).expect("save 1");
        manager.save(&pets, t0()).expect("save 2");

        fs::write(manager.path(), b"{ not json").expect("corrupt");
        let outcome = manager.load(t0());
        assert_eq!(outcome.source, LoadSource::Backup);
        assert_eq!(outcome.pets.len(), 2);
    }

    #[test]
    fn checksum_mismatch_counts_as_corrupt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = PersistenceManager::new(&test_config(dir.path()));
        manager.save(&sample_pets(), t0()).expect("save");

        let text = fs::read_to_string(manager.path()).expect("read");
        let tampered = text.replace("\"Clucky\"", "\"Clacky\"");
        fs::write(manager.path(), tampered).expect("write");

        let outcome = manager.load(t0());
        assert_eq!(outcome.source, LoadSource::Fresh, "no backup exists yet");
    }

    #[test]
    fn checksum_covers_saved_at() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = PersistenceManager::new(&test_config(dir.path()));
        manager.save(&sample_pets(), t0()).expect("save 1");
        manager.save(&sample_pets(), t0()).expect("save 2");

        let text = fs::read_to_string(manager.path()).expect("read");
        let tampered = text.replace(
            "\"saved_at\": \"2024-05-01T09:00:00Z\"",
            "\"saved_at\": \"2024-04-01T09:00:00Z\"",
        );
        assert_ne!(text, tampered);
        fs::write(manager.path(), tampered).expect("write");

        let outcome = manager.load(t0() + Duration::hours(1));
        assert_eq!(outcome.source, LoadSource::Backup);
        assert!((outcome.offline_secs - 3600.0).abs() < 1e-6);
    }

    #[test]
    fn version_one_files_still_verify() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = PersistenceManager::new(&test_config(dir.path()));
        let pets = serde_json::json!({});
        let checksum = envelope_checksum(1, t0(), &pets).expect("checksum");
        let text = format!(
            r#"{{"version": 1, "saved_at": "2024-05-01T09:00:00Z", "checksum": "{checksum}", "pets": {{}}}}"#
        );
        fs::write(manager.path(), text).expect("write");
        assert_eq!(manager.load(t0()).source, LoadSource::Primary);
    }

    #[test]
    fn invalid_state_counts_as_corrupt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut config = test_config(dir.path());
        config.checksum_enabled = false;
        let manager = PersistenceManager::new(&config);
        let mut duck = PetRecord::new("Dewey", Species::Duck, Position::default(), &MoodConfig::default(), t0());
        duck.state = BehaviorState::Sit;
        manager.save([&duck], t0()).expect("save");

        assert_eq!(manager.load(t0()).source, LoadSource::Fresh);
    }

    #[test]
    fn corrupt_primary_does_not_overwrite_good_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = PersistenceManager::new(&test_config(dir.path()));
        let pets = sample_pets();
        manager.save(&pets, t0()).expect("save 1");
        manager.save(&pets, t0()).expect("save 2");
        fs::write(manager.path(), b"garbage").expect("corrupt");

        let report = manager.save(&pets[..1], t0()).expect("save 3");
        assert!(!report.rotated_backup);
        fs::remove_file(manager.path()).expect("remove primary");
        assert_eq!(manager.load(t0()).pets.len(), 2);
    }

    #[test]
    fn forget_removes_pet_from_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = PersistenceManager::new(&test_config(dir.path()));
        let pets = sample_pets();
        manager.save(&pets, t0()).expect("save 1");
        manager.save(&pets[1..], t0()).expect("save 2");

        assert!(manager.forget(pets[0].id).expect("forget"));
        assert!(!manager.forget(pets[0].id).expect("forget again"));

        fs::remove_file(manager.path()).expect("remove primary");
        let outcome = manager.load(t0());
        assert_eq!(outcome.source, LoadSource::Backup);
        assert!(outcome.pets.iter().all(|p| p.id != pets[0].id));
    }

    #[test]
    fn newer_format_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = PersistenceManager::new(&test_config(dir.path()));
        fs::write(
            manager.path(),
            br#"{"version": 99, "saved_at": "2024-05-01T09:00:00Z", "pets": {}}"#,
        )
        .expect("write");
        assert_eq!(manager.load(t0()).source, LoadSource::Fresh);
    }

    #[test]
    fn living_time_checkpoint_before_save() {
        let mut pets = sample_pets();
        checkpoint_living_time(pets.iter_mut(), t0() + Duration::seconds(45));
        assert!((pets[1].memory.total_living_seconds - 45.0).abs() < 1e-6);
    }

    #[test]
    fn sibling_paths() {
        let p = Path::new("/tmp/pet_saves/pets_data.json");
        assert_eq!(sibling(p, "backup"), PathBuf::from("/tmp/pet_saves/pets_data.json.backup"));
    }

    #[test]
    fn crc32_basic() {
        // Known test vector: CRC-32 of "123456789" = 0xCBF43926
        assert_eq!(crc32_compute(b"123456789"), 0xCBF4_3926);
    }
}
