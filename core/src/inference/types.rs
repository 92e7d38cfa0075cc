use thiserror::Error;

use crate::framing::FramingError;
use crate::schema::{SchemaError, SchemaId};

/// How the winning schema was singled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Supplied by the caller, no inference ran.
    Explicit,
    /// The only candidate compatible with every sample.
    Structural,
    /// Several candidates survived; the file name picked one.
    FileName,
}

/// Successful inference outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inference {
    pub schema: SchemaId,
    pub resolution: Resolution,
    /// Records trial-decoded.
    pub samples: usize,
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("no candidate message types available")]
    NoCandidates,

    #[error("no candidate message type matches the data ({samples} record(s) sampled)")]
    NoMatch { samples: usize },

    #[error("message type is ambiguous, candidates: {}", .candidates.join(", "))]
    Ambiguous { candidates: Vec<SchemaId> },

    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error("failed to read sample at offset {offset}: {source}")]
    Read {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
