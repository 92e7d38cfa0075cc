//! protoscan-core
//!
//! Scan files of length-delimited protobuf records whose message type is not
//! known up front: infer the type from a sample, then decode, filter and
//! render every record as newline-delimited JSON.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod utils;

pub mod framing;
pub mod schema;
pub mod inference;
pub mod telemetry;

// Stream layers
pub mod stream;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::framing::{RecordFramer, RecordLocation};
    pub use crate::inference::{infer_schema, Inference, Resolution};
    pub use crate::schema::{Message, ProtoRegistry, RenderStrategy, Schema, SchemaRegistry};
    pub use crate::stream::{scan, InputSource, MatchExpr, ParallelismProfile, ScanConfig};
    pub use crate::telemetry::ScanSnapshot;
    pub use crate::types::StreamError;
}
