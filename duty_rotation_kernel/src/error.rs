//! Configuration errors.
//!
//! These are the only failures the kernel knows about. Everything past
//! configuration is total: stale events are ignored, never reported.

/// A rotation configuration that cannot produce a schedule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The participant list is empty.
    #[error("participant list is empty")]
    NoParticipants,

    /// A participant name is empty after trimming.
    #[error("participant at position {position} has a blank name")]
    BlankParticipant {
        /// Index of the offending entry in the configured list.
        position: usize,
    },

    /// The same name appears twice in the rotation.
    #[error("participant {name:?} appears more than once")]
    DuplicateParticipant {
        /// The repeated name.
        name: String,
    },

    /// An excluded-date entry is not a valid `DD/MM` day.
    #[error("malformed excluded date {entry:?}: expected DD/MM")]
    MalformedExcludedDate {
        /// The raw entry as configured.
        entry: String,
    },

    /// The target year is outside what the calendar arithmetic supports.
    #[error("year {year} is outside the supported range {min}..={max}")]
    YearOutOfRange {
        /// The configured year.
        year: i32,
        /// Smallest accepted year.
        min: i32,
        /// Largest accepted year.
        max: i32,
    },
}
