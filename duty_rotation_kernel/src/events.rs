//! Event definitions.
//!
//! Events are pure data: a slot reference and the participant who spoke.
//! They carry no resolution logic.

use serde::{Deserialize, Serialize};

use crate::domain::SlotId;

/// Sentinel the legacy store put in front of a name to mark an absence.
pub const ABSENCE_TAG_PREFIX: &str = "FALTOU: ";

/// Something a participant declared about a slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DutyEvent {
    /// The duty for the slot was done.
    Completion { slot_id: SlotId, participant: String },
    /// The named participant will not do the slot; the rotation moves on.
    Absence { slot_id: SlotId, participant: String },
}

impl DutyEvent {
    pub fn completion(slot_id: SlotId, participant: impl Into<String>) -> Self {
        DutyEvent::Completion {
            slot_id,
            participant: participant.into(),
        }
    }

    pub fn absence(slot_id: SlotId, participant: impl Into<String>) -> Self {
        DutyEvent::Absence {
            slot_id,
            participant: participant.into(),
        }
    }

    pub fn slot_id(&self) -> SlotId {
        match self {
            DutyEvent::Completion { slot_id, .. } | DutyEvent::Absence { slot_id, .. } => *slot_id,
        }
    }

    pub fn participant(&self) -> &str {
        match self {
            DutyEvent::Completion { participant, .. } | DutyEvent::Absence { participant, .. } => {
                participant
            }
        }
    }

    pub fn is_absence(&self) -> bool {
        matches!(self, DutyEvent::Absence { .. })
    }

    /// Single-string form used by the legacy store: a bare name for a
    /// completion, `FALTOU: <name>` for an absence.
    pub fn legacy_tag(&self) -> String {
        match self {
            DutyEvent::Completion { participant, .. } => participant.clone(),
            DutyEvent::Absence { participant, .. } => format!("{ABSENCE_TAG_PREFIX}{participant}"),
        }
    }

    /// Parse a legacy `(slot_id, participant_tag)` row.
    ///
    /// Returns `None` when the tag names nobody.
    pub fn from_legacy_tag(slot_id: SlotId, tag: &str) -> Option<Self> {
        let (name, absent) = match tag.strip_prefix(ABSENCE_TAG_PREFIX) {
            Some(rest) => (rest, true),
            None => (tag, false),
        };
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(if absent {
            DutyEvent::absence(slot_id, name)
        } else {
            DutyEvent::completion(slot_id, name)
        })
    }
}

/// An event as stored in a log, with the sequence number the log assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub sequence: u64,
    pub event: DutyEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_absence_tag_round_trips() {
        let event = DutyEvent::from_legacy_tag(SlotId(7), "FALTOU: Denise").unwrap();
        assert_eq!(event, DutyEvent::absence(SlotId(7), "Denise"));
        assert_eq!(event.legacy_tag(), "FALTOU: Denise");
    }

    #[test]
    fn bare_name_is_a_completion() {
        let event = DutyEvent::from_legacy_tag(SlotId(7), "Felix").unwrap();
        assert_eq!(event, DutyEvent::completion(SlotId(7), "Felix"));
        assert!(!event.is_absence());
        assert_eq!(event.participant(), "Felix");
    }

    #[test]
    fn empty_tags_are_rejected() {
        assert_eq!(DutyEvent::from_legacy_tag(SlotId(1), ""), None);
        assert_eq!(DutyEvent::from_legacy_tag(SlotId(1), "FALTOU: "), None);
        assert_eq!(DutyEvent::from_legacy_tag(SlotId(1), "   "), None);
    }

    #[test]
    fn json_form_is_tagged() {
        let json = serde_json::to_string(&DutyEvent::absence(SlotId(5), "Ana")).unwrap();
        assert_eq!(json, r#"{"kind":"absence","slot_id":5,"participant":"Ana"}"#);
    }
}
