//! Duty board: one client's live view of the rota.
//!
//! The board owns no durable state. It appends intents to the event log and
//! rebuilds its view from a full read of the log, either right after its own
//! append or when an insert notice arrives.
//!
//! Write order:
//!   1. check the slot exists in this year's schedule
//!   2. event_log.append(event), on failure the view is left as it was
//!   3. full re-read and re-resolution

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, info, warn};

use duty_rotation_kernel::{
    DutyEvent, EventEnvelope, ResolvedSlot, RotationEngine, RotationView, SlotId,
};

use crate::clock::Clock;
use crate::error::{BoardError, LogError};
use crate::event_log::{EventLog, InsertNotice};
use crate::replay;

pub struct DutyBoard {
    engine: RotationEngine,
    log: Arc<dyn EventLog>,
    notices: Receiver<InsertNotice>,
    clock: Arc<dyn Clock>,
    view: RotationView,
    hash: String,
    last_sequence: u64,
}

impl DutyBoard {
    /// Subscribe to `log`, then resolve everything already in it.
    ///
    /// Subscribing first means an append racing with the initial read is
    /// seen at least once.
    pub fn open(
        engine: RotationEngine,
        log: Arc<dyn EventLog>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LogError> {
        let notices = log.subscribe();
        let events = log.list_all()?;
        let (view, hash) = replay::rebuild_view(&engine, &events);

        let board = Self {
            engine,
            log,
            notices,
            clock,
            view,
            hash,
            last_sequence: events.last().map_or(0, |e| e.sequence),
        };
        info!(
            events = board.last_sequence,
            slots = board.view.slots.len(),
            "duty board opened"
        );
        Ok(board)
    }

    /// Re-read the whole log and replace the view.
    pub fn refresh(&mut self) -> Result<(), LogError> {
        let events = self.log.list_all()?;
        let (view, hash) = replay::rebuild_view(&self.engine, &events);

        if view.ignored_events > 0 {
            debug!(ignored = view.ignored_events, "events name slots outside this schedule");
        }

        self.view = view;
        self.hash = hash;
        self.last_sequence = events.last().map_or(0, |e| e.sequence);

        let today = self.clock.today();
        match self.view.current_turn(today) {
            Some(head) => debug!(
                sequence = self.last_sequence,
                head = %head.date,
                assignee = %head.effective_assignee,
                "view refreshed"
            ),
            None => debug!(sequence = self.last_sequence, "view refreshed, queue empty"),
        }
        Ok(())
    }

    /// Drain pending insert notices and refresh once if there were any.
    ///
    /// Returns how many notices were drained.
    pub fn pump_notifications(&mut self) -> Result<usize, LogError> {
        let drained = self.notices.try_iter().count();
        if drained > 0 {
            self.refresh()?;
        }
        Ok(drained)
    }

    /// Block up to `timeout` for an insert notice, then refresh.
    ///
    /// Returns false if nothing arrived.
    pub fn wait_for_notice(&mut self, timeout: Duration) -> Result<bool, LogError> {
        match self.notices.recv_timeout(timeout) {
            Ok(_) => {
                self.notices.try_iter().for_each(drop);
                self.refresh()?;
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Ok(false),
        }
    }

    /// Record that `participant` performed the duty of `slot_id`.
    pub fn record_completion(
        &mut self,
        slot_id: SlotId,
        participant: impl Into<String>,
    ) -> Result<EventEnvelope, BoardError> {
        self.record(DutyEvent::completion(slot_id, participant))
    }

    /// Record that `participant` will not perform `slot_id`.
    pub fn record_absence(
        &mut self,
        slot_id: SlotId,
        participant: impl Into<String>,
    ) -> Result<EventEnvelope, BoardError> {
        self.record(DutyEvent::absence(slot_id, participant))
    }

    /// Complete the head of the queue, credited to its effective assignee.
    pub fn complete_current_turn(&mut self) -> Result<EventEnvelope, BoardError> {
        let head = self.current_turn().ok_or(BoardError::NoPendingTurn)?;
        let (id, assignee) = (head.id, head.effective_assignee.clone());
        self.record_completion(id, assignee)
    }

    /// Report the head as missed, tagged to its nominal assignee.
    ///
    /// The tag is informational; the shift comes from the event itself, so
    /// a second report on the same head moves the rotation again.
    pub fn report_current_absence(&mut self) -> Result<EventEnvelope, BoardError> {
        let head = self.current_turn().ok_or(BoardError::NoPendingTurn)?;
        let (id, assignee) = (head.id, head.nominal_assignee.clone());
        self.record_absence(id, assignee)
    }

    pub fn view(&self) -> &RotationView {
        &self.view
    }

    pub fn engine(&self) -> &RotationEngine {
        &self.engine
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn active_queue(&self) -> Vec<&ResolvedSlot> {
        self.view.active_queue(self.clock.today())
    }

    pub fn current_turn(&self) -> Option<&ResolvedSlot> {
        self.view.current_turn(self.clock.today())
    }

    /// Canonical hash of the current view.
    pub fn current_hash(&self) -> &str {
        &self.hash
    }

    /// Sequence of the last event folded into the view.
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    fn record(&mut self, event: DutyEvent) -> Result<EventEnvelope, BoardError> {
        let slot_id = event.slot_id();
        if self.engine.slot(slot_id).is_none() {
            return Err(BoardError::UnknownSlot(slot_id));
        }

        let envelope = match self.log.append(event) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(slot = %slot_id, error = %e, "append failed, view unchanged");
                return Err(e.into());
            }
        };
        info!(
            sequence = envelope.sequence,
            slot = %slot_id,
            absence = envelope.event.is_absence(),
            participant = envelope.event.participant(),
            "event recorded"
        );

        // The event is durable; a failed re-read only delays the view until
        // the next notice or refresh.
        if let Err(e) = self.refresh() {
            warn!(error = %e, "refresh after append failed");
        }
        Ok(envelope)
    }
}

/// Thread-safe board handle using Mutex.
///
/// Accessors return owned copies so no lock outlives the call.
pub struct SharedBoard {
    inner: Mutex<DutyBoard>,
}

impl SharedBoard {
    pub fn new(board: DutyBoard) -> Self {
        Self {
            inner: Mutex::new(board),
        }
    }

    pub fn record_completion(
        &self,
        slot_id: SlotId,
        participant: impl Into<String>,
    ) -> Result<EventEnvelope, BoardError> {
        self.lock().record_completion(slot_id, participant)
    }

    pub fn record_absence(
        &self,
        slot_id: SlotId,
        participant: impl Into<String>,
    ) -> Result<EventEnvelope, BoardError> {
        self.lock().record_absence(slot_id, participant)
    }

    pub fn complete_current_turn(&self) -> Result<EventEnvelope, BoardError> {
        self.lock().complete_current_turn()
    }

    pub fn report_current_absence(&self) -> Result<EventEnvelope, BoardError> {
        self.lock().report_current_absence()
    }

    pub fn refresh(&self) -> Result<(), LogError> {
        self.lock().refresh()
    }

    pub fn pump_notifications(&self) -> Result<usize, LogError> {
        self.lock().pump_notifications()
    }

    pub fn current_turn(&self) -> Option<ResolvedSlot> {
        self.lock().current_turn().cloned()
    }

    pub fn active_queue(&self) -> Vec<ResolvedSlot> {
        self.lock().active_queue().into_iter().cloned().collect()
    }

    pub fn current_hash(&self) -> String {
        self.lock().current_hash().to_string()
    }

    pub fn last_sequence(&self) -> u64 {
        self.lock().last_sequence()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DutyBoard> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::event_log::MemoryEventLog;
    use chrono::Weekday;
    use duty_rotation_kernel::RotationConfig;

    const NO_DATES: [&str; 0] = [];

    fn board_at(today: NaiveDate) -> (DutyBoard, Arc<MemoryEventLog>) {
        let config =
            RotationConfig::new(["Dinamite", "Denise", "Felix"], NO_DATES, Weekday::Fri, 2026)
                .unwrap();
        let log = Arc::new(MemoryEventLog::new());
        let board = DutyBoard::open(
            RotationEngine::new(config),
            log.clone(),
            Arc::new(FixedClock::at(today)),
        )
        .unwrap();
        (board, log)
    }

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    #[test]
    fn head_is_first_pending_slot_from_today() {
        let (board, _) = board_at(jan(3));
        let head = board.current_turn().unwrap();
        assert_eq!(head.date, jan(9));
        assert_eq!(head.effective_assignee, "Denise");
    }

    #[test]
    fn unknown_slot_appends_nothing() {
        let (mut board, log) = board_at(jan(1));
        let stale = SlotId::from_date(NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());

        let err = board.record_absence(stale, "Denise").unwrap_err();
        assert!(matches!(err, BoardError::UnknownSlot(id) if id == stale));
        assert!(log.is_empty());
    }

    #[test]
    fn absence_reassigns_head_and_keeps_it_pending() {
        let (mut board, _) = board_at(jan(1));
        board.report_current_absence().unwrap();

        let head = board.current_turn().unwrap();
        assert_eq!(head.date, jan(2));
        assert_eq!(head.nominal_assignee, "Dinamite");
        assert_eq!(head.effective_assignee, "Denise");
        assert_eq!(head.absences, 1);
    }

    #[test]
    fn repeated_absence_is_tagged_to_the_nominal_assignee() {
        let (mut board, log) = board_at(jan(1));
        board.report_current_absence().unwrap();
        let second = board.report_current_absence().unwrap();

        assert_eq!(second.event, DutyEvent::absence(SlotId::from_date(jan(2)), "Dinamite"));
        assert_eq!(log.len(), 2);
        assert_eq!(board.current_turn().unwrap().effective_assignee, "Felix");
    }

    #[test]
    fn empty_queue_has_no_pending_turn() {
        let (mut board, _) = board_at(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
        assert!(board.active_queue().is_empty());
        assert!(matches!(
            board.complete_current_turn(),
            Err(BoardError::NoPendingTurn)
        ));
    }

    #[test]
    fn notices_from_another_writer_refresh_the_view() {
        let (mut board, log) = board_at(jan(1));
        let before = board.current_hash().to_string();

        log.append(DutyEvent::completion(SlotId::from_date(jan(2)), "Dinamite"))
            .unwrap();
        assert_eq!(board.current_hash(), before);

        assert_eq!(board.pump_notifications().unwrap(), 1);
        assert_ne!(board.current_hash(), before);
        assert_eq!(board.last_sequence(), 1);
        assert_eq!(board.current_turn().unwrap().date, jan(9));
    }
}
