//! telemetry/snapshot.rs
//!
//! Immutable summary of one scan, built once every stage has joined.

use std::time::Duration;

use serde::Serialize;

use crate::inference::Resolution;
use crate::schema::SchemaId;
use crate::telemetry::counters::ScanCounters;
use crate::telemetry::timers::{ScanTimer, StageTimes};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSnapshot {
    /// Message type used for decoding.
    pub schema: SchemaId,
    pub resolution: Resolution,
    pub counters: ScanCounters,
    pub throughput_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl ScanSnapshot {
    pub fn new(
        schema: SchemaId,
        resolution: Resolution,
        counters: &ScanCounters,
        timer: &ScanTimer,
    ) -> Self {
        let elapsed = timer.elapsed();

        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_decoded as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            schema,
            resolution,
            counters: counters.clone(),
            throughput_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    /// Documents written, or the integer printed in count mode.
    pub fn emitted(&self) -> u64 {
        self.counters.records_emitted
    }

    /// Counts line up across stages.
    pub fn sanity_check(&self) -> bool {
        let c = &self.counters;
        c.records_emitted <= c.records_matched
            && c.records_decoded <= c.records_scanned
            && c.records_matched + c.field_misses <= c.records_decoded.max(c.records_scanned)
    }
}
