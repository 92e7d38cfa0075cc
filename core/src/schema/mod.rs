//! schema/mod.rs
//! Schema registry, decoded-message capability and JSON rendering.
//!
//! Notes:
//! - `SchemaRegistry` resolves identifiers to `Schema` handles.
//! - `Schema::decode` yields a `Message`; inference and the pipeline only
//!   ever talk to these traits.
//! - `ProtoRegistry` is the production implementation over `prost-reflect`.

pub mod types;
pub mod registry;
pub mod message;
pub mod render;

pub use types::*;
pub use registry::{ProtoRegistry, ProtoSchema};
pub use message::ProtoMessage;
