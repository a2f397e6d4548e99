//! Core domain types for the rotation kernel.
//!
//! Pure data. Slots are always derived from configuration, never stored;
//! only events that reference a slot id are ever persisted.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// `NaiveDate::num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;
const MILLIS_PER_DAY: i64 = 86_400_000;

// ── Slot identity ──────────────────────────────────────────────────

/// Stable identifier of a slot: milliseconds from the Unix epoch to
/// midnight UTC of the slot's date.
///
/// Derived from the date alone so regenerating the schedule always yields
/// the same id for the same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(pub i64);

impl SlotId {
    pub fn from_date(date: NaiveDate) -> Self {
        let days = i64::from(date.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE;
        SlotId(days * MILLIS_PER_DAY)
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Excluded dates ─────────────────────────────────────────────────

/// A yearless calendar day, written `DD/MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub fn new(month: u32, day: u32) -> Option<Self> {
        // 2000 is a leap year, so 29/02 is accepted.
        NaiveDate::from_ymd_opt(2000, month, day).map(|_| MonthDay { month, day })
    }

    pub fn of(date: NaiveDate) -> Self {
        MonthDay {
            month: date.month(),
            day: date.day(),
        }
    }
}

impl FromStr for MonthDay {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ConfigError::MalformedExcludedDate {
            entry: s.to_string(),
        };

        let (day, month) = s.trim().split_once('/').ok_or_else(malformed)?;
        let day: u32 = day.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;
        MonthDay::new(month, day).ok_or_else(malformed)
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.day, self.month)
    }
}

// ── Slots ──────────────────────────────────────────────────────────

/// One generated weekly occurrence, before any absence adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub date: NaiveDate,
    /// 0-indexed rank among the generated (non-excluded) slots.
    pub position: usize,
    pub nominal_assignee: String,
}

/// A slot after the event history has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSlot {
    pub id: SlotId,
    pub date: NaiveDate,
    pub position: usize,
    pub nominal_assignee: String,
    pub effective_assignee: String,
    /// Absence events recorded against this slot.
    pub absences: usize,
    pub completed: bool,
}

impl ResolvedSlot {
    /// Whether absences anywhere at or before this slot moved its assignee.
    pub fn is_reassigned(&self) -> bool {
        self.nominal_assignee != self.effective_assignee
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_id_is_utc_midnight_millis() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(SlotId::from_date(epoch), SlotId(0));

        let first_friday = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        assert_eq!(SlotId::from_date(first_friday), SlotId(1_767_312_000_000));
    }

    #[test]
    fn month_day_parses_day_first() {
        let md: MonthDay = "07/09".parse().unwrap();
        assert_eq!(md, MonthDay { month: 9, day: 7 });
        assert_eq!(md.to_string(), "07/09");

        let leap: MonthDay = " 29/02 ".parse().unwrap();
        assert_eq!(leap, MonthDay { month: 2, day: 29 });
    }

    #[test]
    fn month_day_rejects_garbage() {
        for entry in ["", "25-12", "32/01", "00/05", "15/13", "xx/01", "1/2/3"] {
            let err = entry.parse::<MonthDay>().unwrap_err();
            assert_eq!(
                err,
                ConfigError::MalformedExcludedDate {
                    entry: entry.to_string()
                }
            );
        }
    }
}
