//! Where the `pawz` binary finds its configuration.
//!
//! `PAWZ_CONFIG` wins; otherwise `pawz.toml` in the working directory if it
//! exists; otherwise built-in defaults.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use pawz_core::PawzConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PAWZ_CONFIG";

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pawz.toml";

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Path from `PAWZ_CONFIG`.
    Env(PathBuf),
    /// The default file.
    File(PathBuf),
    /// Nothing found; built-in defaults.
    Defaults,
}

/// Load the configuration for this process.
///
/// # Errors
/// Fails if the chosen file cannot be read, parsed or validated. A missing
/// default file is not an error.
pub fn load() -> Result<(PawzConfig, ConfigSource)> {
    load_from(env::var(CONFIG_ENV).ok(), Path::new(DEFAULT_CONFIG_FILE))
}

/// [`load`] with the environment value and default path supplied.
///
/// # Errors
/// See [`load`].
pub fn load_from(env_value: Option<String>, default_path: &Path) -> Result<(PawzConfig, ConfigSource)> {
    if let Some(path) = env_value.filter(|p| !p.trim().is_empty()) {
        let path = PathBuf::from(path);
        let config = read(&path).with_context(|| format!("{CONFIG_ENV} points at an unusable file"))?;
        return Ok((config, ConfigSource::Env(path)));
    }

    if default_path.exists() {
        let config = read(default_path)?;
        return Ok((config, ConfigSource::File(default_path.to_path_buf())));
    }

    let config = PawzConfig::default();
    config.validate().context("built-in defaults are invalid")?;
    Ok((config, ConfigSource::Defaults))
}

fn read(path: &Path) -> Result<PawzConfig> {
    PawzConfig::from_file(path).with_context(|| format!("failed to load config file {}", path.display()))
}
