//! Schedule generation.
//!
//! Walks the cadence weekday through the target year and hands out turns
//! round-robin. Excluded days produce no slot and do not consume a turn.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::config::RotationConfig;
use crate::domain::{Slot, SlotId};

const CADENCE: Days = Days::new(7);

/// Generate the nominal schedule for `config.year()`.
///
/// Pure and deterministic: the same configuration always yields the same
/// slots, ids included.
pub fn generate(config: &RotationConfig) -> Vec<Slot> {
    let mut slots = Vec::new();
    let mut next = first_cadence_day(config.year(), config.weekday());

    while let Some(date) = next.filter(|d| d.year() == config.year()) {
        if !config.is_excluded(date) {
            let position = slots.len();
            slots.push(Slot {
                id: SlotId::from_date(date),
                date,
                position,
                nominal_assignee: config.participant_at(position).to_string(),
            });
        }
        next = date.checked_add_days(CADENCE);
    }

    slots
}

/// First `weekday` on or after January 1 of `year`.
pub fn first_cadence_day(year: i32, weekday: Weekday) -> Option<NaiveDate> {
    let jan_first = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let offset = (7 + weekday.num_days_from_monday() - jan_first.weekday().num_days_from_monday()) % 7;
    jan_first.checked_add_days(Days::new(u64::from(offset)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_DATES: [&str; 0] = [];

    fn names(slots: &[Slot]) -> Vec<&str> {
        slots.iter().map(|s| s.nominal_assignee.as_str()).collect()
    }

    #[test]
    fn first_friday_of_2026_is_january_second() {
        assert_eq!(
            first_cadence_day(2026, Weekday::Fri),
            NaiveDate::from_ymd_opt(2026, 1, 2)
        );
        // 2026-01-01 is itself a Thursday.
        assert_eq!(
            first_cadence_day(2026, Weekday::Thu),
            NaiveDate::from_ymd_opt(2026, 1, 1)
        );
    }

    #[test]
    fn plain_rotation_cycles_without_skipping() {
        let cfg = RotationConfig::new(["A", "B", "C"], NO_DATES, Weekday::Fri, 2026).unwrap();
        let slots = generate(&cfg);

        assert_eq!(slots.len(), 52);
        assert_eq!(&names(&slots)[..7], ["A", "B", "C", "A", "B", "C", "A"]);
        for (i, slot) in slots.iter().enumerate() {
            assert_eq!(slot.position, i);
            assert_eq!(slot.date.weekday(), Weekday::Fri);
            assert_eq!(slot.nominal_assignee, ["A", "B", "C"][i % 3]);
        }
        assert_eq!(slots.last().unwrap().date, NaiveDate::from_ymd_opt(2026, 12, 25).unwrap());
    }

    #[test]
    fn excluded_day_does_not_consume_a_turn() {
        // 2026-01-09 is the second Friday.
        let cfg = RotationConfig::new(["A", "B", "C"], ["09/01"], Weekday::Fri, 2026).unwrap();
        let slots = generate(&cfg);

        assert_eq!(slots.len(), 51);
        assert_eq!(slots[0].date, NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
        assert_eq!(slots[1].date, NaiveDate::from_ymd_opt(2026, 1, 16).unwrap());
        assert_eq!(&names(&slots)[..4], ["A", "B", "C", "A"]);
        assert!(slots.iter().all(|s| s.date != NaiveDate::from_ymd_opt(2026, 1, 9).unwrap()));
    }

    #[test]
    fn generation_is_deterministic() {
        let cfg = RotationConfig::new(["A", "B"], ["25/12", "01/05"], Weekday::Fri, 2026).unwrap();
        assert_eq!(generate(&cfg), generate(&cfg));
    }

    #[test]
    fn single_participant_takes_every_turn() {
        let cfg = RotationConfig::new(["Solo"], ["02/01"], Weekday::Fri, 2026).unwrap();
        let slots = generate(&cfg);
        assert_eq!(slots.len(), 51);
        assert!(slots.iter().all(|s| s.nominal_assignee == "Solo"));
    }

    #[test]
    fn leap_day_exclusion_is_inert_in_common_years() {
        let with = RotationConfig::new(["A", "B"], ["29/02"], Weekday::Sat, 2026).unwrap();
        let without = RotationConfig::new(["A", "B"], NO_DATES, Weekday::Sat, 2026).unwrap();
        assert_eq!(generate(&with), generate(&without));

        // 2020-02-29 was a Saturday.
        let leap = RotationConfig::new(["A", "B"], ["29/02"], Weekday::Sat, 2020).unwrap();
        assert_eq!(generate(&leap).len(), 51);
    }
}
