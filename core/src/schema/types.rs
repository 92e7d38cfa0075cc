//! schema/types.rs
//! Capability traits shared by every registry implementation.
//!
//! The pipeline never branches on where a schema came from: everything it
//! needs from a message (decode, re-encoded size, unknown data, field lookup,
//! rendering) goes through `Schema` and `Message`.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Fully-qualified message name, e.g. `telemetry.v1.Heartbeat`.
pub type SchemaId = String;

/// Registry of decodable message types.
pub trait SchemaRegistry: Send + Sync {
    type Schema: Schema;

    /// Resolve an identifier to a decoder handle.
    fn resolve(&self, id: &str) -> Result<Self::Schema, SchemaError>;

    /// Every identifier eligible for inference, in a stable order.
    fn candidates(&self) -> Vec<SchemaId>;
}

/// Decoder handle for one message type. Cheap to clone, shareable.
pub trait Schema: Clone + Send + Sync {
    type Message: Message;

    fn id(&self) -> &str;

    /// Decode one payload. Structural errors are `SchemaError::Decode`.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Message, SchemaError>;
}

/// A decoded message value, bound to exactly one schema.
pub trait Message: Send + 'static {
    /// Number of fields the schema could not map to a declaration.
    fn unknown_field_count(&self) -> usize;

    /// Encoded size once unknown fields are dropped.
    fn encoded_len_without_unknown(&self) -> usize;

    /// Look up a string-typed field by its declared name.
    fn string_field(&self, name: &str) -> Result<Cow<'_, str>, FieldError>;

    /// Append this message as one JSON object to `out`.
    fn render_json(&self, strategy: RenderStrategy, out: &mut Vec<u8>) -> Result<(), SchemaError>;
}

/// JSON rendering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStrategy {
    /// Reflective walk: proto field names, plain JSON numbers.
    #[default]
    Fast,
    /// Canonical protobuf JSON mapping, slower.
    Exact,
}

impl fmt::Display for RenderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RenderStrategy::Fast => "fast",
            RenderStrategy::Exact => "exact",
        })
    }
}

impl FromStr for RenderStrategy {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Ok(RenderStrategy::Fast),
            "exact" => Ok(RenderStrategy::Exact),
            other => Err(SchemaError::Render(format!("unknown render strategy '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("no field named '{0}'")]
    NotFound(String),
    #[error("field '{field}' is {kind}, not a string")]
    NotString { field: String, kind: String },
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("unknown message type '{0}'")]
    NotFound(String),

    #[error("failed to decode as '{schema}': {reason}")]
    Decode { schema: SchemaId, reason: String },

    #[error("invalid descriptor set: {0}")]
    Descriptor(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
