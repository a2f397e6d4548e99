//! Replay orchestrator: rebuild the rota from the event log.
//!
//! Delegates all rotation logic to the kernel. No cached state, no
//! incremental patching.

use duty_rotation_kernel::hashing::canonical_hash;
use duty_rotation_kernel::{EventEnvelope, RotationEngine, RotationView};

/// Resolve `events` against the engine's schedule.
///
/// Returns (view, canonical_hash). Pure on the event stream.
pub fn rebuild_view(engine: &RotationEngine, events: &[EventEnvelope]) -> (RotationView, String) {
    let view = engine.replay_envelopes(events);
    let hash = canonical_hash(&view);
    (view, hash)
}

/// Rebuild and return only the canonical hash.
pub fn rebuild_hash(engine: &RotationEngine, events: &[EventEnvelope]) -> String {
    rebuild_view(engine, events).1
}

