//! Schedule invariants.
//!
//! Structural checks over a generated schedule and a resolved view. They
//! hold for anything `schedule::generate` and `resolver::resolve` produce;
//! they exist to catch a schedule or view that came from somewhere else
//! (a stale cache, a foreign client) before it is trusted.

use std::collections::HashSet;

use chrono::{Datelike, Days};

use crate::config::RotationConfig;
use crate::domain::{Slot, SlotId};
use crate::resolver::RotationView;

/// First failed check.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[INVARIANT:{rule}] {detail}")]
pub struct InvariantViolation {
    pub rule: &'static str,
    pub detail: String,
}

fn violation(rule: &'static str, detail: String) -> InvariantViolation {
    InvariantViolation { rule, detail }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every schedule check against `config`. Returns the first failure.
pub fn check_schedule(config: &RotationConfig, slots: &[Slot]) -> Result<(), InvariantViolation> {
    check_positions(slots)?;
    check_ids(slots)?;
    check_cadence(config, slots)?;
    check_exclusions(config, slots)?;
    check_round_robin(config, slots)?;
    Ok(())
}

/// Check that `view` was resolved from `slots`: same slots, same order,
/// and every effective assignee is a configured participant.
pub fn check_view(
    config: &RotationConfig,
    slots: &[Slot],
    view: &RotationView,
) -> Result<(), InvariantViolation> {
    if view.slots.len() != slots.len() {
        return Err(violation(
            "view_shape",
            format!("view has {} slots, schedule has {}", view.slots.len(), slots.len()),
        ));
    }
    for (resolved, slot) in view.slots.iter().zip(slots) {
        if resolved.id != slot.id || resolved.nominal_assignee != slot.nominal_assignee {
            return Err(violation(
                "view_shape",
                format!("view slot {} does not match schedule slot {}", resolved.id, slot.id),
            ));
        }
        if !config.participants().contains(&resolved.effective_assignee) {
            return Err(violation(
                "view_assignee",
                format!(
                    "slot {} is assigned to unknown participant {:?}",
                    resolved.id, resolved.effective_assignee
                ),
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

fn check_positions(slots: &[Slot]) -> Result<(), InvariantViolation> {
    for (i, slot) in slots.iter().enumerate() {
        if slot.position != i {
            return Err(violation(
                "positions",
                format!("slot {} has position {}, expected {}", slot.id, slot.position, i),
            ));
        }
    }
    Ok(())
}

fn check_ids(slots: &[Slot]) -> Result<(), InvariantViolation> {
    let mut seen = HashSet::new();
    for slot in slots {
        if slot.id != SlotId::from_date(slot.date) {
            return Err(violation(
                "slot_id",
                format!("slot dated {} carries id {}", slot.date, slot.id),
            ));
        }
        if !seen.insert(slot.id) {
            return Err(violation("slot_id", format!("slot id {} appears twice", slot.id)));
        }
    }
    Ok(())
}

fn check_cadence(config: &RotationConfig, slots: &[Slot]) -> Result<(), InvariantViolation> {
    for slot in slots {
        if slot.date.weekday() != config.weekday() || slot.date.year() != config.year() {
            return Err(violation(
                "cadence",
                format!(
                    "slot {} falls on {} {}, expected a {} in {}",
                    slot.id,
                    slot.date.weekday(),
                    slot.date,
                    config.weekday(),
                    config.year()
                ),
            ));
        }
    }
    for pair in slots.windows(2) {
        if pair[0].date.checked_add_days(Days::new(7)).map_or(true, |d| d > pair[1].date) {
            return Err(violation(
                "cadence",
                format!("slots {} and {} are out of order", pair[0].date, pair[1].date),
            ));
        }
    }
    Ok(())
}

fn check_exclusions(config: &RotationConfig, slots: &[Slot]) -> Result<(), InvariantViolation> {
    match slots.iter().find(|s| config.is_excluded(s.date)) {
        Some(slot) => Err(violation(
            "exclusions",
            format!("slot {} falls on excluded day {}", slot.id, slot.date),
        )),
        None => Ok(()),
    }
}

fn check_round_robin(config: &RotationConfig, slots: &[Slot]) -> Result<(), InvariantViolation> {
    for slot in slots {
        let expected = config.participant_at(slot.position);
        if slot.nominal_assignee != expected {
            return Err(violation(
                "round_robin",
                format!(
                    "slot {} is nominally {:?}, rotation says {:?}",
                    slot.id, slot.nominal_assignee, expected
                ),
            ));
        }
    }
    Ok(())
}
