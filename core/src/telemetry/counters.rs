//! telemetry/counters.rs
//! Mutable counters used during a scan.
//!
//! Each stage owns its own `ScanCounters` and hands it back when it
//! finishes; the pipeline merges them once every thread has joined.
use std::ops::AddAssign;

use serde::Serialize;

/// Deterministic counters collected during record processing
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScanCounters {
    /// Locations emitted by the framer.
    pub records_scanned: u64,
    pub records_decoded: u64,
    /// Messages that passed the predicate (or every message, without one).
    pub records_matched: u64,
    /// Documents handed to the sink, or the count printed in count mode.
    pub records_emitted: u64,
    /// Messages skipped because the predicate field was absent or not a string.
    pub field_misses: u64,
    pub bytes_decoded: u64,
    pub bytes_rendered: u64,
}

impl ScanCounters {
    pub fn add_scanned(&mut self) {
        self.records_scanned += 1;
    }

    /// Record one payload decoded from `payload_len` bytes.
    pub fn add_decoded(&mut self, payload_len: usize) {
        self.records_decoded += 1;
        self.bytes_decoded += payload_len as u64;
    }

    pub fn add_matched(&mut self) {
        self.records_matched += 1;
    }

    pub fn add_miss(&mut self) {
        self.field_misses += 1;
    }

    /// Record one JSON document of `doc_len` bytes (newline excluded).
    pub fn add_rendered(&mut self, doc_len: usize) {
        self.bytes_rendered += doc_len as u64;
    }

    pub fn add_emitted(&mut self) {
        self.records_emitted += 1;
    }

    // Per-thread counters merged after join: no locks, no atomics.
    pub fn merge(&mut self, other: &ScanCounters) {
        self.records_scanned += other.records_scanned;
        self.records_decoded += other.records_decoded;
        self.records_matched += other.records_matched;
        self.records_emitted += other.records_emitted;
        self.field_misses += other.field_misses;
        self.bytes_decoded += other.bytes_decoded;
        self.bytes_rendered += other.bytes_rendered;
    }
}

impl AddAssign for ScanCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
