// Shared fixtures: descriptor sets built in code and framed record files.

#![allow(dead_code)]

use std::path::PathBuf;

use prost::Message as _;
use prost_reflect::{DynamicMessage, Value};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet,
};
use tempfile::TempDir;

use protoscan_core::framing::encode_varint;
use protoscan_core::schema::ProtoRegistry;

pub const PACKAGE: &str = "test.v1";

pub fn scalar(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.into()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

pub fn typed(name: &str, number: i32, ty: Type, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(format!(".{PACKAGE}.{type_name}")),
        ..scalar(name, number, ty)
    }
}

pub fn repeated(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        label: Some(Label::Repeated as i32),
        ..scalar(name, number, ty)
    }
}

pub fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.into()),
        field: fields,
        ..Default::default()
    }
}

pub fn file(messages: Vec<DescriptorProto>, enums: Vec<EnumDescriptorProto>) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("test/v1/fixtures.proto".into()),
        package: Some(PACKAGE.into()),
        message_type: messages,
        enum_type: enums,
        syntax: Some("proto3".into()),
        ..Default::default()
    }
}

pub fn registry(file: FileDescriptorProto) -> ProtoRegistry {
    ProtoRegistry::from_descriptor_set(FileDescriptorSet { file: vec![file] })
        .expect("fixture descriptors are valid")
}

pub fn full(name: &str) -> String {
    format!("{PACKAGE}.{name}")
}

// ------------------------------------------------------------
// Registries
// ------------------------------------------------------------

/// `Heartbeat { host, seq }` and `Beacon { host }`.
pub fn heartbeat_registry() -> ProtoRegistry {
    registry(file(
        vec![
            message(
                "Heartbeat",
                vec![scalar("host", 1, Type::String), scalar("seq", 2, Type::Uint64)],
            ),
            message("Beacon", vec![scalar("host", 1, Type::String)]),
        ],
        vec![],
    ))
}

/// `Heartbeat` and `Probe`, structurally identical.
pub fn twin_registry() -> ProtoRegistry {
    let fields = || vec![scalar("host", 1, Type::String), scalar("seq", 2, Type::Uint64)];
    registry(file(
        vec![message("Heartbeat", fields()), message("Probe", fields())],
        vec![],
    ))
}

/// `Order` with a nested `Customer`, an enum, bytes, floats and a list.
pub fn order_registry() -> ProtoRegistry {
    let status = EnumDescriptorProto {
        name: Some("Status".into()),
        value: ["STATUS_UNKNOWN", "STATUS_OPEN", "STATUS_SHIPPED"]
            .iter()
            .enumerate()
            .map(|(i, name)| EnumValueDescriptorProto {
                name: Some((*name).into()),
                number: Some(i as i32),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    };

    registry(file(
        vec![
            message(
                "Order",
                vec![
                    scalar("id", 1, Type::String),
                    typed("customer", 2, Type::Message, "Customer"),
                    scalar("total", 3, Type::Double),
                    scalar("blob", 4, Type::Bytes),
                    typed("status", 5, Type::Enum, "Status"),
                    repeated("tags", 6, Type::String),
                    scalar("quantity", 7, Type::Int64),
                ],
            ),
            message(
                "Customer",
                vec![scalar("name", 1, Type::String), scalar("email", 2, Type::String)],
            ),
        ],
        vec![status],
    ))
}

// ------------------------------------------------------------
// Messages
// ------------------------------------------------------------

pub fn dynamic(registry: &ProtoRegistry, name: &str, fields: Vec<(&str, Value)>) -> DynamicMessage {
    let desc = registry
        .pool()
        .get_message_by_name(&full(name))
        .expect("fixture message exists");
    let mut msg = DynamicMessage::new(desc);
    for (field, value) in fields {
        msg.set_field_by_name(field, value);
    }
    msg
}

pub fn heartbeat(registry: &ProtoRegistry, host: &str, seq: u64) -> DynamicMessage {
    dynamic(
        registry,
        "Heartbeat",
        vec![("host", Value::String(host.into())), ("seq", Value::U64(seq))],
    )
}

pub fn beacon(registry: &ProtoRegistry, host: &str) -> DynamicMessage {
    dynamic(registry, "Beacon", vec![("host", Value::String(host.into()))])
}

pub fn customer(registry: &ProtoRegistry, name: &str) -> DynamicMessage {
    dynamic(
        registry,
        "Customer",
        vec![
            ("name", Value::String(name.into())),
            ("email", Value::String(format!("{}@example.com", name.to_lowercase()))),
        ],
    )
}

pub fn order(registry: &ProtoRegistry, id: &str, customer_name: &str, total: f64) -> DynamicMessage {
    dynamic(
        registry,
        "Order",
        vec![
            ("id", Value::String(id.into())),
            ("customer", Value::Message(customer(registry, customer_name))),
            ("total", Value::F64(total)),
        ],
    )
}

// ------------------------------------------------------------
// Framed data
// ------------------------------------------------------------

/// Concatenate `[varint len][payload]` records.
pub fn framed(messages: &[DynamicMessage]) -> Vec<u8> {
    messages
        .iter()
        .flat_map(|m| m.encode_length_delimited_to_vec())
        .collect()
}

/// Frame raw payloads.
pub fn framed_raw(payloads: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for p in payloads {
        encode_varint(p.len() as u64, &mut out);
        out.extend_from_slice(p);
    }
    out
}

/// `n` heartbeats with hosts `host-0..n` and seq `1..=n`.
pub fn heartbeats(registry: &ProtoRegistry, n: usize) -> Vec<DynamicMessage> {
    (0..n)
        .map(|i| heartbeat(registry, &format!("host-{i}"), i as u64 + 1))
        .collect()
}

pub fn write_temp(file_name: &str, bytes: &[u8]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(file_name);
    std::fs::write(&path, bytes).expect("write fixture");
    (dir, path)
}

/// Parse newline-delimited JSON output.
pub fn json_lines(out: &[u8]) -> Vec<serde_json::Value> {
    std::str::from_utf8(out)
        .expect("utf-8 output")
        .lines()
        .map(|l| serde_json::from_str(l).expect("valid json line"))
        .collect()
}
