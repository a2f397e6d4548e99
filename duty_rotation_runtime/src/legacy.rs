//! Import of rows exported from the legacy store.
//!
//! The legacy store kept one free-text tag per row: a bare name for a
//! completion, `FALTOU: <name>` for an absence. Rows are appended to the log
//! in file order; rows whose tag names nobody are skipped.
//!
//! Legacy slot ids are the epoch milliseconds of local midnight on the
//! exporting device, not UTC midnight. Each id is moved to the nearest UTC
//! midnight, which recovers the calendar date for any UTC offset under
//! twelve hours.

use serde::Deserialize;
use tracing::{debug, info, warn};

use duty_rotation_kernel::{DutyEvent, SlotId};

use crate::error::ImportError;
use crate::event_log::EventLog;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// One exported row, e.g. `{"slot_id": 1767312000000, "participant_tag": "FALTOU: Denise"}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LegacyRow {
    #[serde(alias = "slotId")]
    pub slot_id: i64,
    #[serde(alias = "participantTag")]
    pub participant_tag: String,
}

impl LegacyRow {
    /// The slot this row refers to, or `None` if the id is out of range.
    pub fn slot(&self) -> Option<SlotId> {
        realign_to_utc_midnight(self.slot_id).map(SlotId)
    }

    pub fn to_event(&self) -> Option<DutyEvent> {
        DutyEvent::from_legacy_tag(self.slot()?, &self.participant_tag)
    }
}

/// Round epoch milliseconds to the nearest UTC midnight.
pub fn realign_to_utc_midnight(millis: i64) -> Option<i64> {
    let shifted = millis.checked_add(MILLIS_PER_DAY / 2)?;
    shifted.div_euclid(MILLIS_PER_DAY).checked_mul(MILLIS_PER_DAY)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub completions: usize,
    pub absences: usize,
    pub skipped: usize,
    /// Imported rows whose id was not already at UTC midnight.
    pub realigned: usize,
    /// Sequence of the last appended event, if any.
    pub last_sequence: Option<u64>,
}

impl ImportReport {
    pub fn imported(&self) -> usize {
        self.completions + self.absences
    }
}

/// Parse a JSON array of legacy rows.
pub fn parse_rows(json: &str) -> Result<Vec<LegacyRow>, ImportError> {
    Ok(serde_json::from_str(json)?)
}

/// Parse `json` and append every usable row to `log`.
///
/// Parsing finishes before anything is appended, so malformed JSON leaves
/// the log untouched. An append failure stops the import; rows appended
/// before it stay in the log.
pub fn import_legacy(log: &dyn EventLog, json: &str) -> Result<ImportReport, ImportError> {
    let rows = parse_rows(json)?;
    let mut report = ImportReport::default();

    for (index, row) in rows.iter().enumerate() {
        let Some(slot) = row.slot() else {
            warn!(row = index, slot = row.slot_id, "legacy slot id out of range, skipped");
            report.skipped += 1;
            continue;
        };
        let Some(event) = DutyEvent::from_legacy_tag(slot, &row.participant_tag) else {
            warn!(row = index, slot = row.slot_id, "legacy row names nobody, skipped");
            report.skipped += 1;
            continue;
        };
        if slot.as_i64() != row.slot_id {
            debug!(row = index, from = row.slot_id, to = %slot, "legacy slot id realigned");
            report.realigned += 1;
        }
        let absence = event.is_absence();
        let envelope = log.append(event)?;
        if absence {
            report.absences += 1;
        } else {
            report.completions += 1;
        }
        report.last_sequence = Some(envelope.sequence);
    }

    info!(
        completions = report.completions,
        absences = report.absences,
        skipped = report.skipped,
        realigned = report.realigned,
        "legacy import finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::MemoryEventLog;

    // 2026-01-01 and 2026-01-02 at 00:00 UTC.
    const JAN_1: i64 = 1_767_225_600_000;
    const JAN_2: i64 = 1_767_312_000_000;

    #[test]
    fn accepts_both_key_styles() {
        let rows = parse_rows(
            r#"[{"slot_id": 1767225600000, "participant_tag": "Ana"},
                {"slotId": 1767312000000, "participantTag": "FALTOU: Bia"}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].to_event(), Some(DutyEvent::completion(SlotId(JAN_1), "Ana")));
        assert_eq!(rows[1].to_event(), Some(DutyEvent::absence(SlotId(JAN_2), "Bia")));
    }

    #[test]
    fn local_midnight_ids_map_to_the_calendar_date() {
        // Midnight of 2 January in São Paulo (UTC-3) and in Tokyo (UTC+9).
        assert_eq!(realign_to_utc_midnight(1_767_322_800_000), Some(JAN_2));
        assert_eq!(realign_to_utc_midnight(1_767_279_600_000), Some(JAN_2));
        assert_eq!(realign_to_utc_midnight(JAN_2), Some(JAN_2));
        assert_eq!(realign_to_utc_midnight(-3 * 3_600_000), Some(0));
        assert_eq!(realign_to_utc_midnight(i64::MAX), None);
    }

    #[test]
    fn import_reports_realigned_rows() {
        let log = MemoryEventLog::new();
        let report = import_legacy(
            &log,
            r#"[{"slot_id": 1767322800000, "participant_tag": "FALTOU: Bia"},
                {"slot_id": 1767225600000, "participant_tag": "Ana"},
                {"slot_id": 9223372036854775807, "participant_tag": "Ana"}]"#,
        )
        .unwrap();
        assert_eq!(report.realigned, 1);
        assert_eq!(report.skipped, 1);
        let events: Vec<DutyEvent> = log.list_all().unwrap().into_iter().map(|e| e.event).collect();
        assert_eq!(
            events,
            vec![
                DutyEvent::absence(SlotId(JAN_2), "Bia"),
                DutyEvent::completion(SlotId(JAN_1), "Ana"),
            ]
        );
    }

    #[test]
    fn blank_tags_are_skipped() {
        let log = MemoryEventLog::new();
        let report = import_legacy(
            &log,
            r#"[{"slot_id": 1, "participant_tag": "FALTOU: "},
                {"slot_id": 1, "participant_tag": "  "},
                {"slot_id": 1, "participant_tag": "Ana"}]"#,
        )
        .unwrap();
        assert_eq!(report.skipped, 2);
        assert_eq!(report.imported(), 1);
        assert_eq!(report.last_sequence, Some(1));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn malformed_json_appends_nothing() {
        let log = MemoryEventLog::new();
        let err = import_legacy(&log, r#"[{"slot_id": "x"}]"#).unwrap_err();
        assert!(matches!(err, ImportError::Json(_)));
        assert!(log.is_empty());
    }
}
