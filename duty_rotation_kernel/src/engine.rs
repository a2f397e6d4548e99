//! Rotation engine.
//!
//! Owns a validated configuration and the schedule generated from it.
//! Holds no event state: every replay resolves the full snapshot it is
//! given, so two engines fed the same events always agree.

use chrono::NaiveDate;

use crate::config::RotationConfig;
use crate::domain::{Slot, SlotId};
use crate::events::{DutyEvent, EventEnvelope};
use crate::hashing::canonical_hash;
use crate::resolver::{resolve, RotationView};
use crate::schedule::generate;

pub struct RotationEngine {
    config: RotationConfig,
    schedule: Vec<Slot>,
}

impl RotationEngine {
    /// Generate the year's schedule once; it never changes afterwards.
    pub fn new(config: RotationConfig) -> Self {
        let schedule = generate(&config);
        Self { config, schedule }
    }

    pub fn config(&self) -> &RotationConfig {
        &self.config
    }

    /// The nominal schedule, before any absence adjustment.
    pub fn schedule(&self) -> &[Slot] {
        &self.schedule
    }

    pub fn slot(&self, id: SlotId) -> Option<&Slot> {
        self.schedule.iter().find(|s| s.id == id)
    }

    pub fn slot_on(&self, date: NaiveDate) -> Option<&Slot> {
        self.slot(SlotId::from_date(date))
    }

    /// Resolve the schedule against a full event snapshot.
    pub fn replay<'a, I>(&self, events: I) -> RotationView
    where
        I: IntoIterator<Item = &'a DutyEvent>,
    {
        resolve(&self.config, &self.schedule, events)
    }

    /// Resolve against log envelopes; sequence numbers play no part.
    pub fn replay_envelopes(&self, envelopes: &[EventEnvelope]) -> RotationView {
        self.replay(envelopes.iter().map(|e| &e.event))
    }

    /// Replay and return only the canonical hash.
    pub fn replay_hash(&self, envelopes: &[EventEnvelope]) -> String {
        canonical_hash(&self.replay_envelopes(envelopes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn engine() -> RotationEngine {
        let config =
            RotationConfig::new(["Dinamite", "Denise", "Felix"], ["25/12"], Weekday::Fri, 2026)
                .unwrap();
        RotationEngine::new(config)
    }

    #[test]
    fn lookup_by_id_and_date() {
        let engine = engine();
        let second = &engine.schedule()[1];
        assert_eq!(engine.slot(second.id), Some(second));
        assert_eq!(engine.slot_on(second.date), Some(second));
        assert_eq!(engine.slot_on(NaiveDate::from_ymd_opt(2026, 12, 25).unwrap()), None);
    }

    #[test]
    fn replay_envelopes_matches_bare_events() {
        let engine = engine();
        let id = engine.schedule()[0].id;
        let envelopes = vec![
            EventEnvelope {
                sequence: 1,
                event: DutyEvent::absence(id, "Dinamite"),
            },
            EventEnvelope {
                sequence: 2,
                event: DutyEvent::completion(id, "Denise"),
            },
        ];
        let bare: Vec<DutyEvent> = envelopes.iter().map(|e| e.event.clone()).collect();
        assert_eq!(engine.replay_envelopes(&envelopes), engine.replay(&bare));
        assert_eq!(engine.replay_hash(&envelopes), canonical_hash(&engine.replay(&bare)));
    }
}
