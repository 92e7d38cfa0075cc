use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::framing::FramingError;
use crate::inference::InferenceError;
use crate::schema::{SchemaError, SchemaId};
use crate::stream::match_filter::MatchExprError;

/// Unified scan error covering I/O, framing, schema, inference and
/// pipeline failures.
/// - `From<T>` impls enable `?` across the pipeline.
/// - Messages are stable and carry offsets where a record is involved.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot open input '{}': {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("message type could not be inferred: {0}")]
    Inference(#[from] InferenceError),

    #[error("invalid match expression: {0}")]
    MatchExpr(#[from] MatchExprError),

    /// Positioned read of a confirmed record failed.
    #[error("failed to read record at offset {offset}: {source}")]
    Read {
        offset: u64,
        #[source]
        source: io::Error,
    },

    /// A record the framer located does not decode under the inferred type.
    #[error("record at offset {offset} ({length} bytes) does not decode as {schema}: {source}")]
    Decode {
        offset: u64,
        length: u64,
        schema: SchemaId,
        #[source]
        source: SchemaError,
    },

    #[error("failed to render record at offset {offset}: {source}")]
    Render {
        offset: u64,
        #[source]
        source: SchemaError,
    },

    #[error("failed to write output: {0}")]
    Write(#[source] io::Error),

    /// Internal wiring failure (thread panic, channel torn down early).
    #[error("pipeline error: {0}")]
    Pipeline(&'static str),

    #[error("validation error: {0}")]
    Validation(String),
}
