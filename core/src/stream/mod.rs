//! stream/mod.rs
//! Concurrent decode → filter → serialize over framed records.
//!
//! Layering: `io` normalizes input and output, the workers and the filter
//! each own one stage, `pipeline` wires them with bounded channels and
//! `core` is the public entry point.

pub mod cancel;
pub mod core;
pub mod decode_worker;
pub mod io;
pub mod match_filter;
pub mod parallelism;
pub mod pipeline;
pub mod serialize_worker;
pub mod types;

pub use io::{InputSource, RecordSource, FileSource, MemorySource, DocumentWriter};
pub use match_filter::{MatchExpr, MatchExprError, MatchFilter, Verdict};
pub use parallelism::ParallelismProfile;
pub use pipeline::{run_scan_pipeline, count_records, PipelineConfig};
pub use self::core::{scan, scan_source, determine_schema, ScanConfig};
