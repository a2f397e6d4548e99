//! Event log service interface.
//!
//! The log is the only shared mutable resource and the single source of
//! truth. It is append-only: no edits, no deletes. Appends are atomic and
//! receive the next sequence number; every append to the log is announced
//! to every subscriber, whichever client made it.

use std::sync::Mutex;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

use duty_rotation_kernel::{DutyEvent, EventEnvelope};

use crate::error::LogError;

/// Announcement that an event was durably appended.
///
/// Carries the new envelope, but receivers must still re-read the whole
/// log: notices can repeat and unrelated events can arrive in any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertNotice {
    pub envelope: EventEnvelope,
}

/// Append-only store of duty events with insert notifications.
pub trait EventLog: Send + Sync {
    /// Durably append `event`. On error nothing was written.
    fn append(&self, event: DutyEvent) -> Result<EventEnvelope, LogError>;

    /// Every stored event, in sequence order.
    fn list_all(&self) -> Result<Vec<EventEnvelope>, LogError>;

    /// Receive a notice for every append made from now on, by any client.
    fn subscribe(&self) -> Receiver<InsertNotice>;
}

/// Fan-out of insert notices. Dropped receivers are pruned on send.
#[derive(Default)]
pub struct Subscribers {
    senders: Mutex<Vec<Sender<InsertNotice>>>,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<InsertNotice> {
        let (tx, rx) = unbounded();
        self.lock().push(tx);
        rx
    }

    pub fn notify(&self, envelope: &EventEnvelope) {
        let mut senders = self.lock();
        senders.retain(|tx| {
            tx.send(InsertNotice {
                envelope: envelope.clone(),
            })
            .is_ok()
        });
        debug!(
            sequence = envelope.sequence,
            subscribers = senders.len(),
            "insert notice sent"
        );
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Sender<InsertNotice>>> {
        // A panic while holding this lock cannot leave the list half-edited.
        self.senders.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// In-memory event log with the same contract as the file-backed one.
#[derive(Default)]
pub struct MemoryEventLog {
    events: Mutex<Vec<EventEnvelope>>,
    subscribers: Subscribers,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing envelopes, e.g. a snapshot read elsewhere.
    pub fn with_events(events: Vec<EventEnvelope>) -> Result<Self, LogError> {
        check_sequence(&events)?;
        Ok(Self {
            events: Mutex::new(events),
            subscribers: Subscribers::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<EventEnvelope>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventLog for MemoryEventLog {
    fn append(&self, event: DutyEvent) -> Result<EventEnvelope, LogError> {
        let envelope = {
            let mut events = self.lock();
            let sequence = events.last().map_or(0, |e| e.sequence) + 1;
            let envelope = EventEnvelope { sequence, event };
            events.push(envelope.clone());
            envelope
        };
        self.subscribers.notify(&envelope);
        Ok(envelope)
    }

    fn list_all(&self) -> Result<Vec<EventEnvelope>, LogError> {
        Ok(self.lock().clone())
    }

    fn subscribe(&self) -> Receiver<InsertNotice> {
        self.subscribers.subscribe()
    }
}

/// Sequence numbers must run 1, 2, 3, ... without gaps.
pub fn check_sequence(events: &[EventEnvelope]) -> Result<(), LogError> {
    for (i, envelope) in events.iter().enumerate() {
        let expected = i as u64 + 1;
        if envelope.sequence != expected {
            return Err(LogError::SequenceViolation {
                expected,
                found: envelope.sequence,
            });
        }
    }
    Ok(())
}
