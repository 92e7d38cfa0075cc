use crate::telemetry::{ScanCounters, StageTimes};

/// Decoded message travelling from the decoder pool to the filter.
#[derive(Debug)]
pub struct DecodedRecord<M> {
    /// Payload offset, kept for diagnostics.
    pub offset: u64,
    pub message: M,
}

/// Rendered JSON document (no trailing newline).
#[derive(Debug)]
pub struct RenderedDocument {
    pub offset: u64,
    pub json: Vec<u8>,
}

/// What a stage thread hands back when it exits.
#[derive(Debug, Default, Clone)]
pub struct StageReport {
    pub counters: ScanCounters,
    pub stage_times: StageTimes,
}

impl StageReport {
    pub fn merge(&mut self, other: &StageReport) {
        self.counters.merge(&other.counters);
        self.stage_times.merge(&other.stage_times);
    }
}
