//! Structural schema inference.
//!
//! Given a sample of framed records and a candidate set, narrow the set to
//! the one message type that accounts for every sampled byte.

pub mod types;
pub mod compat;
pub mod infer;

pub use types::{Inference, InferenceError, Resolution};
pub use compat::structurally_compatible;
pub use infer::{infer_schema, narrow_by_file_name, resolve_explicit};
