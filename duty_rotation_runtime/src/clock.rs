//! Source of "today" for the active queue.
//!
//! The board never calls the system clock directly, so tests can pin the
//! date and step it forward explicitly.

use std::sync::Mutex;

use chrono::{Days, Local, NaiveDate};

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn at(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        *self.lock() = today;
    }

    /// Advance by `days`. Past the last representable date it stays put.
    pub fn advance_days(&self, days: u64) {
        let mut today = self.lock();
        if let Some(next) = today.checked_add_days(Days::new(days)) {
            *today = next;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NaiveDate> {
        self.today.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_moves_only_when_told() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let clock = FixedClock::at(start);
        assert_eq!(clock.today(), start);

        clock.advance_days(7);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 1, 9).unwrap());

        clock.set(start);
        assert_eq!(clock.today(), start);
    }
}
