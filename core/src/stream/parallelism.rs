use tracing::debug;

use crate::constants::{
    DEFAULT_DECODE_WORKERS, DEFAULT_INFLIGHT_RECORDS, DEFAULT_SERIALIZE_WORKERS,
    MAX_INFLIGHT_RECORDS, MAX_WORKERS,
};
use crate::types::StreamError;

/// Parallelism configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelismProfile {
    /// Decoder pool width.
    pub decode_workers: usize,
    /// Serializer pool width.
    pub serialize_workers: usize,
    /// Capacity of every inter-stage channel.
    pub inflight: usize,
}

impl Default for ParallelismProfile {
    fn default() -> Self {
        Self {
            decode_workers: DEFAULT_DECODE_WORKERS,
            serialize_workers: DEFAULT_SERIALIZE_WORKERS,
            inflight: DEFAULT_INFLIGHT_RECORDS,
        }
    }
}

impl ParallelismProfile {
    pub fn single_threaded() -> Self {
        Self {
            decode_workers: 1,
            serialize_workers: 1,
            inflight: 1,
        }
    }

    /// Size both pools from the number of logical cores.
    pub fn dynamic() -> Self {
        let cores = num_cpus::get();
        let decode_workers = cores.saturating_sub(1).max(1); // leave one core for the framer
        let serialize_workers = (cores / 2).max(1);

        debug!(cores, decode_workers, serialize_workers, "dynamic parallelism profile");

        Self {
            decode_workers,
            serialize_workers,
            inflight: DEFAULT_INFLIGHT_RECORDS,
        }
    }

    pub fn with_workers(mut self, decode_workers: usize, serialize_workers: usize) -> Self {
        self.decode_workers = decode_workers;
        self.serialize_workers = serialize_workers;
        self
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if !(1..=MAX_WORKERS).contains(&self.decode_workers) {
            return Err(StreamError::Validation(format!(
                "invalid decode worker count: {}, must be in 1..={MAX_WORKERS}",
                self.decode_workers
            )));
        }
        if !(1..=MAX_WORKERS).contains(&self.serialize_workers) {
            return Err(StreamError::Validation(format!(
                "invalid serialize worker count: {}, must be in 1..={MAX_WORKERS}",
                self.serialize_workers
            )));
        }
        if !(1..=MAX_INFLIGHT_RECORDS).contains(&self.inflight) {
            return Err(StreamError::Validation(format!(
                "invalid inflight capacity: {}, must be in 1..={MAX_INFLIGHT_RECORDS}",
                self.inflight
            )));
        }
        Ok(())
    }
}
