#![forbid(unsafe_code)]

//! Duty rotation kernel.
//!
//! Generates a weekly duty schedule and resolves it against the event
//! history. Pure and deterministic: no I/O, no clock, no global state.
//! Persistence, notification and presentation live in the runtime crate.

/// Rotation rules v1. Any change to how shifts or completions resolve
/// requires a new version, since it changes every canonical hash.
pub const RULESET_VERSION: u32 = 1;

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod events;
pub mod hashing;
pub mod invariants;
pub mod resolver;
pub mod schedule;

pub use config::RotationConfig;
pub use domain::{MonthDay, ResolvedSlot, Slot, SlotId};
pub use engine::RotationEngine;
pub use error::ConfigError;
pub use events::{DutyEvent, EventEnvelope};
pub use resolver::RotationView;
