#![forbid(unsafe_code)]

//! Duty rotation runtime.
//!
//! Wraps the rotation kernel with an append-only event log, insert
//! notifications, the duty board client, convergence checks, settings and
//! legacy import.
//!
//! No rotation logic lives here: schedules and assignments always come
//! from replaying the full log through the kernel.

pub mod board;
pub mod clock;
pub mod convergence;
pub mod error;
pub mod event_log;
pub mod event_store;
pub mod legacy;
pub mod proto_bridge;
pub mod proto_types;
pub mod replay;
pub mod settings;

pub use board::{DutyBoard, SharedBoard};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{BoardError, ImportError, LogError, SettingsError};
pub use event_log::{EventLog, InsertNotice, MemoryEventLog};
pub use event_store::FileEventLog;
pub use settings::Settings;
