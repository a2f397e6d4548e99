//! Convergence checks: determinism verification and view comparison.
//!
//! Two clients that read the same log must show the same rota. These
//! helpers prove it for one client (replay twice) and explain it when two
//! clients disagree (slot-level diff).

use chrono::NaiveDate;

use duty_rotation_kernel::hashing::canonical_hash;
use duty_rotation_kernel::invariants::{check_view, InvariantViolation};
use duty_rotation_kernel::{EventEnvelope, RotationEngine, RotationView, SlotId};

use crate::replay;

/// Why a replay could not be trusted.
#[derive(Debug, thiserror::Error)]
pub enum ConvergenceError {
    #[error("determinism failure: two replays produced {first} and {second}")]
    Nondeterministic { first: String, second: String },

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// Replay `events` twice, and once more in reverse, and require the same
/// hash each time. Also checks the view against the schedule.
///
/// Returns the agreed canonical hash.
pub fn verify_determinism(
    engine: &RotationEngine,
    events: &[EventEnvelope],
) -> Result<String, ConvergenceError> {
    let (view, first) = replay::rebuild_view(engine, events);
    let second = replay::rebuild_hash(engine, events);
    if first != second {
        return Err(ConvergenceError::Nondeterministic { first, second });
    }

    let reversed = engine.replay(events.iter().rev().map(|e| &e.event));
    let third = canonical_hash(&reversed);
    if first != third {
        return Err(ConvergenceError::Nondeterministic {
            first,
            second: third,
        });
    }

    check_view(engine.config(), engine.schedule(), &view)?;
    Ok(first)
}

/// Slot-level differences between two views of the same schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDiff {
    pub hash_a: String,
    pub hash_b: String,
    /// Slots whose effective assignee differs.
    pub reassigned: Vec<SlotId>,
    /// Slots completed in one view but not the other.
    pub completion_changed: Vec<SlotId>,
    pub head_a: Option<SlotId>,
    pub head_b: Option<SlotId>,
    pub absences_a: usize,
    pub absences_b: usize,
}

impl ViewDiff {
    pub fn converged(&self) -> bool {
        self.hash_a == self.hash_b
    }
}

/// Compare two views slot by slot.
///
/// Slots present in only one view are reported as reassigned.
pub fn compare_views(a: &RotationView, b: &RotationView, today: NaiveDate) -> ViewDiff {
    let mut reassigned = Vec::new();
    let mut completion_changed = Vec::new();

    for slot_a in &a.slots {
        match b.slot(slot_a.id) {
            Some(slot_b) => {
                if slot_a.effective_assignee != slot_b.effective_assignee {
                    reassigned.push(slot_a.id);
                }
                if slot_a.completed != slot_b.completed {
                    completion_changed.push(slot_a.id);
                }
            }
            None => reassigned.push(slot_a.id),
        }
    }
    for slot_b in &b.slots {
        if a.slot(slot_b.id).is_none() {
            reassigned.push(slot_b.id);
        }
    }

    ViewDiff {
        hash_a: canonical_hash(a),
        hash_b: canonical_hash(b),
        reassigned,
        completion_changed,
        head_a: a.current_turn(today).map(|s| s.id),
        head_b: b.current_turn(today).map(|s| s.id),
        absences_a: a.total_absences(),
        absences_b: b.total_absences(),
    }
}
