//! Hand-written protobuf types for the on-disk event log.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//! Field numbers are part of the file format and never change.
//!
//! ```proto
//! message EventEnvelope {
//!   uint64 sequence = 1;
//!   Event event = 2;
//! }
//! message Event {
//!   oneof kind {
//!     Completion completion = 1;
//!     Absence absence = 2;
//!   }
//! }
//! message Completion { int64 slot_id = 1; string participant = 2; }
//! message Absence    { int64 slot_id = 1; string participant = 2; }
//! ```

use prost::Message;

// ── Event Envelope ─────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoEventEnvelope {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(message, optional, tag = "2")]
    pub event: Option<ProtoEvent>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoEvent {
    #[prost(oneof = "EventKind", tags = "1, 2")]
    pub kind: Option<EventKind>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum EventKind {
    #[prost(message, tag = "1")]
    Completion(Completion),
    #[prost(message, tag = "2")]
    Absence(Absence),
}

// ── Event Types ────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct Completion {
    #[prost(int64, tag = "1")]
    pub slot_id: i64,
    #[prost(string, tag = "2")]
    pub participant: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct Absence {
    #[prost(int64, tag = "1")]
    pub slot_id: i64,
    #[prost(string, tag = "2")]
    pub participant: String,
}
