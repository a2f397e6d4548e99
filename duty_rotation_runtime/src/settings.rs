//! TOML settings for the duty board.
//!
//! Every field is optional; missing fields fall back to the household
//! defaults below.

use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use chrono::Weekday;
use serde::Deserialize;
use tracing::info;

use duty_rotation_kernel::RotationConfig;

use crate::error::SettingsError;

pub const DEFAULT_SETTINGS_PATH: &str = "duty-board.toml";
pub const DEFAULT_LOG_PATH: &str = "duty-events.log";

const DEFAULT_PARTICIPANTS: [&str; 3] = ["Dinamite", "Denise", "Felix"];

/// Public holidays, `DD/MM`.
const DEFAULT_HOLIDAYS: [&str; 13] = [
    "01/01", "16/02", "17/02", "03/04", "21/04", "01/05", "04/06", "07/09", "12/10", "02/11",
    "15/11", "20/11", "25/12",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub year: i32,
    /// Cadence weekday, e.g. `"friday"` or `"fri"`.
    pub weekday: String,
    pub participants: Vec<String>,
    /// Excluded days, `DD/MM`.
    pub excluded: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            year: 2026,
            weekday: "friday".to_string(),
            participants: DEFAULT_PARTICIPANTS.iter().map(|s| s.to_string()).collect(),
            excluded: DEFAULT_HOLIDAYS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FromStr for Settings {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    /// Like [`Settings::load`], but a missing file means defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        match Self::load(path) {
            Err(SettingsError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Validate into a kernel configuration.
    pub fn into_config(self) -> Result<RotationConfig, SettingsError> {
        let weekday = Weekday::from_str(self.weekday.trim())
            .map_err(|_| SettingsError::Weekday(self.weekday.clone()))?;
        Ok(RotationConfig::new(
            self.participants,
            self.excluded,
            weekday,
            self.year,
        )?)
    }
}
