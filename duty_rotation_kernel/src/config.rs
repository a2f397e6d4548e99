//! Validated rotation configuration.
//!
//! Every check happens here, before any slot is generated. A
//! `RotationConfig` that exists is always safe to generate from.

use std::collections::{BTreeSet, HashSet};

use chrono::{NaiveDate, Weekday};

use crate::domain::MonthDay;
use crate::error::ConfigError;

pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// Participants, excluded days, cadence weekday and target year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationConfig {
    participants: Vec<String>,
    excluded: BTreeSet<MonthDay>,
    weekday: Weekday,
    year: i32,
}

impl RotationConfig {
    /// Build a configuration from raw inputs.
    ///
    /// Participant names are trimmed; order is preserved and defines
    /// rotation precedence. Excluded days use the `DD/MM` form.
    pub fn new<P, E>(
        participants: P,
        excluded: E,
        weekday: Weekday,
        year: i32,
    ) -> Result<Self, ConfigError>
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let participants = validate_participants(participants)?;

        let excluded = excluded
            .into_iter()
            .map(|entry| entry.as_ref().parse::<MonthDay>())
            .collect::<Result<BTreeSet<_>, _>>()?;

        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(ConfigError::YearOutOfRange {
                year,
                min: MIN_YEAR,
                max: MAX_YEAR,
            });
        }

        Ok(Self {
            participants,
            excluded,
            weekday,
            year,
        })
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    /// Participant owning rotation index `index`, wrapping around the list.
    pub fn participant_at(&self, index: usize) -> &str {
        // Non-empty by construction.
        &self.participants[index % self.participants.len()]
    }

    pub fn excluded(&self) -> &BTreeSet<MonthDay> {
        &self.excluded
    }

    pub fn is_excluded(&self, date: NaiveDate) -> bool {
        self.excluded.contains(&MonthDay::of(date))
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    pub fn year(&self) -> i32 {
        self.year
    }
}

fn validate_participants<P>(participants: P) -> Result<Vec<String>, ConfigError>
where
    P: IntoIterator,
    P::Item: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for (position, raw) in participants.into_iter().enumerate() {
        let name = raw.as_ref().trim();
        if name.is_empty() {
            return Err(ConfigError::BlankParticipant { position });
        }
        if !seen.insert(name.to_string()) {
            return Err(ConfigError::DuplicateParticipant {
                name: name.to_string(),
            });
        }
        names.push(name.to_string());
    }

    if names.is_empty() {
        return Err(ConfigError::NoParticipants);
    }
    Ok(names)
}
