//! telemetry/mod.rs
//! Scan telemetry: per-stage counters, stage timers and the immutable
//! snapshot returned by every scan.

pub mod counters;
pub mod timers;
pub mod snapshot;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
