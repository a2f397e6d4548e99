//! Canonical hashing of a resolved view.
//!
//! Two clients that observed the same event set must display the same
//! state; comparing canonical hashes is how they prove it.
//!
//! Rules:
//!   - Slots in schedule order (ascending date)
//!   - Fixed field order per slot
//!   - UTF-8 JSON, no whitespace, integers only
//!   - `ignored_events` is left out: it describes the log, not the rota

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::resolver::RotationView;
use crate::RULESET_VERSION;

/// Canonical serialization of a view to UTF-8 JSON bytes.
pub fn canonical_serialize(view: &RotationView) -> Vec<u8> {
    build_canonical_value(view).to_string().into_bytes()
}

/// SHA-256 of the canonical serialization. Lowercase hex.
pub fn canonical_hash(view: &RotationView) -> String {
    let digest = Sha256::digest(canonical_serialize(view));
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Field order: ruleset_version, slots[id, date, position, nominal,
/// effective, absences, completed].
fn build_canonical_value(view: &RotationView) -> Value {
    let slots: Vec<Value> = view
        .slots
        .iter()
        .map(|s| {
            let mut slot = Map::new();
            slot.insert("id".to_string(), Value::Number(s.id.as_i64().into()));
            slot.insert(
                "date".to_string(),
                Value::String(s.date.format("%Y-%m-%d").to_string()),
            );
            slot.insert("position".to_string(), Value::Number((s.position as u64).into()));
            slot.insert("nominal".to_string(), Value::String(s.nominal_assignee.clone()));
            slot.insert(
                "effective".to_string(),
                Value::String(s.effective_assignee.clone()),
            );
            slot.insert("absences".to_string(), Value::Number((s.absences as u64).into()));
            slot.insert("completed".to_string(), Value::Bool(s.completed));
            Value::Object(slot)
        })
        .collect();

    // ruleset_version first: it is part of the view's identity.
    let mut root = Map::new();
    root.insert(
        "ruleset_version".to_string(),
        Value::Number(u64::from(RULESET_VERSION).into()),
    );
    root.insert("slots".to_string(), Value::Array(slots));
    Value::Object(root)
}
