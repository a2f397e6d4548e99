//! Rotation resolution.
//!
//! Applies the full event history to the nominal schedule in one pass.
//! The result is a pure aggregate over the events: reordering them never
//! changes the outcome, and applying the same completion twice is a no-op.
//!
//! Absence rule: every absence recorded against a slot advances the
//! rotation by one for that slot and for every later slot. The shift of a
//! slot at position `p` is the number of absences recorded against slots at
//! positions `0..=p`, and its effective assignee is
//! `participants[(p + shift) % N]`.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::RotationConfig;
use crate::domain::{ResolvedSlot, Slot, SlotId};
use crate::events::DutyEvent;

/// The resolved year: every slot with its effective assignee and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationView {
    pub slots: Vec<ResolvedSlot>,
    /// Events that named a slot outside the schedule.
    pub ignored_events: usize,
}

impl RotationView {
    pub fn slot(&self, id: SlotId) -> Option<&ResolvedSlot> {
        self.slots.iter().find(|s| s.id == id)
    }

    /// Pending slots from `today` on, earliest first.
    pub fn active_queue(&self, today: NaiveDate) -> Vec<&ResolvedSlot> {
        active_queue(&self.slots, today)
    }

    /// Head of the active queue: whose turn it is now.
    pub fn current_turn(&self, today: NaiveDate) -> Option<&ResolvedSlot> {
        self.active_queue(today).into_iter().next()
    }

    /// Total absences across the year.
    pub fn total_absences(&self) -> usize {
        self.slots.iter().map(|s| s.absences).sum()
    }
}

#[derive(Default, Clone, Copy)]
struct Tally {
    absences: usize,
    completed: bool,
}

/// Resolve `slots` (as produced by [`crate::schedule::generate`] for
/// `config`) against every event observed so far.
pub fn resolve<'a, I>(config: &RotationConfig, slots: &[Slot], events: I) -> RotationView
where
    I: IntoIterator<Item = &'a DutyEvent>,
{
    let index: HashMap<SlotId, usize> = slots
        .iter()
        .enumerate()
        .map(|(i, slot)| (slot.id, i))
        .collect();

    let mut tallies = vec![Tally::default(); slots.len()];
    let mut ignored_events = 0;

    for event in events {
        let Some(&i) = index.get(&event.slot_id()) else {
            ignored_events += 1;
            continue;
        };
        match event {
            DutyEvent::Completion { .. } => tallies[i].completed = true,
            DutyEvent::Absence { .. } => tallies[i].absences += 1,
        }
    }

    let mut shift = 0;
    let resolved = slots
        .iter()
        .zip(&tallies)
        .map(|(slot, tally)| {
            shift += tally.absences;
            ResolvedSlot {
                id: slot.id,
                date: slot.date,
                position: slot.position,
                nominal_assignee: slot.nominal_assignee.clone(),
                effective_assignee: config.participant_at(slot.position + shift).to_string(),
                absences: tally.absences,
                completed: tally.completed,
            }
        })
        .collect();

    RotationView {
        slots: resolved,
        ignored_events,
    }
}

/// Slots that are neither completed nor in the past, ordered by date.
pub fn active_queue(slots: &[ResolvedSlot], today: NaiveDate) -> Vec<&ResolvedSlot> {
    let mut queue: Vec<&ResolvedSlot> = slots
        .iter()
        .filter(|s| !s.completed && s.date >= today)
        .collect();
    queue.sort_by_key(|s| s.date);
    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::generate;
    use chrono::Weekday;

    const NO_DATES: [&str; 0] = [];
    const NO_EVENTS: [DutyEvent; 0] = [];

    fn abc() -> (RotationConfig, Vec<Slot>) {
        let cfg = RotationConfig::new(["A", "B", "C"], NO_DATES, Weekday::Fri, 2026).unwrap();
        let slots = generate(&cfg);
        (cfg, slots)
    }

    fn effective(view: &RotationView, n: usize) -> Vec<&str> {
        view.slots[..n]
            .iter()
            .map(|s| s.effective_assignee.as_str())
            .collect()
    }

    #[test]
    fn no_events_means_effective_equals_nominal() {
        let (cfg, slots) = abc();
        let view = resolve(&cfg, &slots, &NO_EVENTS);
        assert!(view.slots.iter().all(|s| !s.is_reassigned() && !s.completed));
        assert_eq!(view.ignored_events, 0);
    }

    #[test]
    fn absence_shifts_its_slot_and_everything_after() {
        let (cfg, slots) = abc();
        let events = [DutyEvent::absence(slots[1].id, "B")];
        let view = resolve(&cfg, &slots, &events);

        assert_eq!(effective(&view, 5), ["A", "C", "A", "B", "C"]);
        assert_eq!(view.slots[1].absences, 1);
        assert!(!view.slots[1].completed);
        assert!(view.slots[1..].iter().all(|s| s.is_reassigned()));
        assert!(!view.slots[0].is_reassigned());
    }

    #[test]
    fn repeated_absences_each_count() {
        let (cfg, slots) = abc();
        let events = [
            DutyEvent::absence(slots[0].id, "A"),
            DutyEvent::absence(slots[0].id, "B"),
            DutyEvent::absence(slots[2].id, "A"),
        ];
        let view = resolve(&cfg, &slots, &events);
        // Shifts: 2, 2, 3, 3, 3.
        assert_eq!(effective(&view, 5), ["C", "A", "C", "A", "B"]);
        assert_eq!(view.total_absences(), 3);
    }

    #[test]
    fn duplicate_completion_is_idempotent() {
        let (cfg, slots) = abc();
        let once = resolve(&cfg, &slots, &[DutyEvent::completion(slots[0].id, "A")]);
        let twice = resolve(
            &cfg,
            &slots,
            &[
                DutyEvent::completion(slots[0].id, "A"),
                DutyEvent::completion(slots[0].id, "A"),
            ],
        );
        assert_eq!(once, twice);
        assert!(once.slots[0].completed);
    }

    #[test]
    fn completion_does_not_move_the_rotation() {
        let (cfg, slots) = abc();
        let view = resolve(&cfg, &slots, &[DutyEvent::completion(slots[0].id, "C")]);
        assert_eq!(effective(&view, 4), ["A", "B", "C", "A"]);
    }

    #[test]
    fn unknown_slots_are_ignored() {
        let (cfg, slots) = abc();
        let stale = SlotId::from_date(NaiveDate::from_ymd_opt(2025, 12, 26).unwrap());
        let events = [
            DutyEvent::absence(stale, "A"),
            DutyEvent::completion(SlotId(42), "B"),
        ];
        let view = resolve(&cfg, &slots, &events);
        assert_eq!(view.ignored_events, 2);
        assert_eq!(view.slots, resolve(&cfg, &slots, &NO_EVENTS).slots);
    }

    #[test]
    fn event_order_is_irrelevant() {
        let (cfg, slots) = abc();
        let mut events = vec![
            DutyEvent::absence(slots[3].id, "A"),
            DutyEvent::completion(slots[0].id, "A"),
            DutyEvent::absence(slots[1].id, "B"),
            DutyEvent::completion(slots[1].id, "C"),
        ];
        let forward = resolve(&cfg, &slots, &events);
        events.reverse();
        assert_eq!(forward, resolve(&cfg, &slots, &events));
    }

    #[test]
    fn single_participant_absorbs_absences() {
        let cfg = RotationConfig::new(["Solo"], NO_DATES, Weekday::Fri, 2026).unwrap();
        let slots = generate(&cfg);
        let view = resolve(&cfg, &slots, &[DutyEvent::absence(slots[0].id, "Solo")]);
        assert!(view.slots.iter().all(|s| s.effective_assignee == "Solo"));
    }

    #[test]
    fn active_queue_skips_past_and_completed() {
        let (cfg, slots) = abc();
        let events = [DutyEvent::completion(slots[2].id, "C")];
        let view = resolve(&cfg, &slots, &events);

        // Between the second and third Fridays.
        let today = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();
        let queue = view.active_queue(today);

        assert_eq!(queue[0].id, slots[3].id);
        assert_eq!(queue.len(), slots.len() - 3);
        assert!(queue.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn slot_dated_today_is_still_pending() {
        let (cfg, slots) = abc();
        let view = resolve(&cfg, &slots, &NO_EVENTS);
        let head = view.current_turn(slots[4].date).unwrap();
        assert_eq!(head.id, slots[4].id);
    }

    #[test]
    fn queue_is_empty_after_the_year() {
        let (cfg, slots) = abc();
        let view = resolve(&cfg, &slots, &NO_EVENTS);
        let next_year = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        assert!(view.current_turn(next_year).is_none());
    }
}
