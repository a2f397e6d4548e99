//! Proto ↔ kernel conversion bridge.
//!
//! The kernel never sees protobuf types. Decoding is strict: an envelope
//! without an event, or an event without a kind, is corruption.

use duty_rotation_kernel::{DutyEvent, EventEnvelope, SlotId};

use crate::proto_types::*;

/// Convert a kernel envelope to its wire form.
pub fn kernel_to_proto(envelope: &EventEnvelope) -> ProtoEventEnvelope {
    let kind = match &envelope.event {
        DutyEvent::Completion {
            slot_id,
            participant,
        } => EventKind::Completion(Completion {
            slot_id: slot_id.as_i64(),
            participant: participant.clone(),
        }),
        DutyEvent::Absence {
            slot_id,
            participant,
        } => EventKind::Absence(Absence {
            slot_id: slot_id.as_i64(),
            participant: participant.clone(),
        }),
    };

    ProtoEventEnvelope {
        sequence: envelope.sequence,
        event: Some(ProtoEvent { kind: Some(kind) }),
    }
}

/// Convert a wire envelope back to the kernel's form.
///
/// Returns a description of what is missing when the envelope is
/// incomplete.
pub fn proto_to_kernel(proto: &ProtoEventEnvelope) -> Result<EventEnvelope, String> {
    let kind = proto
        .event
        .as_ref()
        .ok_or_else(|| format!("envelope {} has no event", proto.sequence))?
        .kind
        .as_ref()
        .ok_or_else(|| format!("event {} has no kind", proto.sequence))?;

    let event = match kind {
        EventKind::Completion(c) => DutyEvent::completion(SlotId(c.slot_id), c.participant.clone()),
        EventKind::Absence(a) => DutyEvent::absence(SlotId(a.slot_id), a.participant.clone()),
    };

    Ok(EventEnvelope {
        sequence: proto.sequence,
        event,
    })
}
