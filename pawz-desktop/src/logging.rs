//! Tracing subscriber setup.
//!
//! `RUST_LOG` overrides `general.log_level` when set. `general.log_format`
//! picks human-readable (`pretty`) or one JSON object per line (`json`).

use tracing_subscriber::EnvFilter;

use pawz_core::config::GeneralConfig;

use crate::error::{AppError, Result};

/// Install the global subscriber.
///
/// # Errors
/// [`AppError::Logging`] for an unparsable filter or if a subscriber is
/// already installed.
pub fn init(general: &GeneralConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&general.log_level).map_err(|e| AppError::Logging(e.to_string()))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let installed = if general.log_format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| AppError::Logging(e.to_string()))
}
