//! schema/registry.rs
//! Descriptor-set backed registry.
//!
//! Schemas are loaded from compiled descriptor sets
//! (`protoc --include_imports --descriptor_set_out=...`). Only top-level
//! messages of non-excluded packages are offered as inference candidates;
//! nested and well-known types remain resolvable by name.

use std::path::Path;

use prost::Message as _;
use prost_reflect::{DescriptorPool, DynamicMessage, MessageDescriptor};
use prost_types::FileDescriptorSet;
use tracing::debug;

use crate::constants::EXCLUDED_PACKAGE_PREFIXES;
use crate::schema::message::ProtoMessage;
use crate::schema::types::{Schema, SchemaError, SchemaId, SchemaRegistry};

#[derive(Debug, Clone, Default)]
pub struct ProtoRegistry {
    pool: DescriptorPool,
}

impl ProtoRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an in-memory `FileDescriptorSet`.
    pub fn from_descriptor_set(set: FileDescriptorSet) -> Result<Self, SchemaError> {
        let mut registry = Self::new();
        registry.add_descriptor_set(set)?;
        Ok(registry)
    }

    /// Build from one or more descriptor set files.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, SchemaError> {
        let mut registry = Self::new();
        for path in paths {
            let bytes = std::fs::read(path.as_ref())?;
            registry.add_descriptor_set_bytes(&bytes)?;
            debug!(path = %path.as_ref().display(), "loaded descriptor set");
        }
        Ok(registry)
    }

    pub fn add_descriptor_set_bytes(&mut self, bytes: &[u8]) -> Result<(), SchemaError> {
        let set = FileDescriptorSet::decode(bytes)
            .map_err(|e| SchemaError::Descriptor(e.to_string()))?;
        self.add_descriptor_set(set)
    }

    pub fn add_descriptor_set(&mut self, set: FileDescriptorSet) -> Result<(), SchemaError> {
        self.pool
            .add_file_descriptor_set(set)
            .map_err(|e| SchemaError::Descriptor(e.to_string()))
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }
}

impl SchemaRegistry for ProtoRegistry {
    type Schema = ProtoSchema;

    fn resolve(&self, id: &str) -> Result<ProtoSchema, SchemaError> {
        self.pool
            .get_message_by_name(id)
            .map(ProtoSchema::new)
            .ok_or_else(|| SchemaError::NotFound(id.to_owned()))
    }

    fn candidates(&self) -> Vec<SchemaId> {
        self.pool
            .files()
            .filter(|file| {
                !EXCLUDED_PACKAGE_PREFIXES
                    .iter()
                    .any(|prefix| file.package_name().starts_with(prefix))
            })
            .flat_map(|file| {
                file.messages()
                    .map(|m| m.full_name().to_owned())
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

/// Decoder handle over a runtime message descriptor.
#[derive(Debug, Clone)]
pub struct ProtoSchema {
    desc: MessageDescriptor,
}

impl ProtoSchema {
    pub fn new(desc: MessageDescriptor) -> Self {
        Self { desc }
    }
}

impl Schema for ProtoSchema {
    type Message = ProtoMessage;

    fn id(&self) -> &str {
        self.desc.full_name()
    }

    fn decode(&self, bytes: &[u8]) -> Result<ProtoMessage, SchemaError> {
        DynamicMessage::decode(self.desc.clone(), bytes)
            .map(ProtoMessage::new)
            .map_err(|e| SchemaError::Decode {
                schema: self.desc.full_name().to_owned(),
                reason: e.to_string(),
            })
    }
}
