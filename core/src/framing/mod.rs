//! Record framing for length-delimited logs.
//!
//! Responsibilities:
//! - Decode varint length prefixes
//! - Produce `RecordLocation`s in file order
//! - Stop quietly on truncated trailing data
//!
//! Non-responsibilities:
//! - Schemas
//! - Decoding payloads
//! - Parallelism

pub mod types;
pub mod varint;
pub mod scan;

pub use types::{
    RecordLocation,
    FramingError,
    VarintError,
};
pub use varint::{decode_varint, encode_varint, varint_len};
pub use scan::{RecordFramer, collect_sample};
