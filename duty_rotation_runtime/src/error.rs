//! Runtime error types.

use std::io;
use std::path::PathBuf;

use duty_rotation_kernel::{ConfigError, SlotId};

/// Failures of the event log service.
///
/// A failed append never leaves a partial event behind; callers treat it
/// as "nothing happened" and may retry.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("event log I/O failed: {0}")]
    Io(#[from] io::Error),

    /// A frame on disk is truncated, oversized or not a valid event.
    #[error("corrupt event log at byte {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    /// Stored sequence numbers are not strictly consecutive.
    #[error("sequence violation in event log: expected {expected}, found {found}")]
    SequenceViolation { expected: u64, found: u64 },

    /// The backing store refused the write.
    #[error("event log unavailable: {0}")]
    Unavailable(String),
}

/// Failures of a duty board operation.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error(transparent)]
    Log(#[from] LogError),

    /// The slot id names no slot of the configured year.
    #[error("no slot with id {0} in this schedule")]
    UnknownSlot(SlotId),

    /// Every slot from today on is already completed.
    #[error("no pending turn: the active queue is empty")]
    NoPendingTurn,
}

/// Failures loading the TOML settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown cadence weekday {0:?}")]
    Weekday(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Failures importing rows from the legacy store.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("legacy export is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Log(#[from] LogError),
}
