//! schema/render.rs
//! JSON renderers for decoded messages.
//!
//! - `render_fast`: reflective walk over set fields. Proto field names,
//!   64-bit integers as plain numbers, enums as numbers, bytes as base64.
//! - `render_exact`: the protobuf JSON mapping from `prost-reflect`, keeping
//!   the original proto field names.
//!
//! Both go through `serde_json::Value`, whose object keys are sorted, so the
//! same message always renders to the same bytes.

use base64::{engine::general_purpose::STANDARD, Engine};
use prost_reflect::{DynamicMessage, MapKey, SerializeOptions, Value};
use serde_json::{Map, Number, Value as Json};

use crate::schema::types::SchemaError;

pub fn render_fast(msg: &DynamicMessage, out: &mut Vec<u8>) -> Result<(), SchemaError> {
    let doc = message_to_json(msg);
    serde_json::to_writer(&mut *out, &doc).map_err(|e| SchemaError::Render(e.to_string()))
}

pub fn render_exact(msg: &DynamicMessage, out: &mut Vec<u8>) -> Result<(), SchemaError> {
    let options = SerializeOptions::new().use_proto_field_name(true);
    let doc = msg
        .serialize_with_options(serde_json::value::Serializer, &options)
        .map_err(|e| SchemaError::Render(e.to_string()))?;
    serde_json::to_writer(&mut *out, &doc).map_err(|e| SchemaError::Render(e.to_string()))
}

fn message_to_json(msg: &DynamicMessage) -> Json {
    let mut object = Map::new();
    for (field, value) in msg.fields() {
        object.insert(field.name().to_owned(), value_to_json(value));
    }
    Json::Object(object)
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Bool(b) => Json::Bool(*b),
        Value::I32(n) => Json::from(*n),
        Value::I64(n) => Json::from(*n),
        Value::U32(n) => Json::from(*n),
        Value::U64(n) => Json::from(*n),
        Value::F32(f) => float_to_json(*f as f64),
        Value::F64(f) => float_to_json(*f),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(b) => Json::String(STANDARD.encode(b)),
        Value::EnumNumber(n) => Json::from(*n),
        Value::Message(m) => message_to_json(m),
        Value::List(items) => Json::Array(items.iter().map(value_to_json).collect()),
        Value::Map(entries) => Json::Object(
            entries
                .iter()
                .map(|(k, v)| (map_key_to_string(k), value_to_json(v)))
                .collect(),
        ),
    }
}

// JSON has no NaN/Infinity literals; use the protobuf JSON spellings.
fn float_to_json(f: f64) -> Json {
    match Number::from_f64(f) {
        Some(n) => Json::Number(n),
        None if f.is_nan() => Json::String("NaN".into()),
        None if f.is_sign_positive() => Json::String("Infinity".into()),
        None => Json::String("-Infinity".into()),
    }
}

fn map_key_to_string(key: &MapKey) -> String {
    match key {
        MapKey::Bool(b) => b.to_string(),
        MapKey::I32(n) => n.to_string(),
        MapKey::I64(n) => n.to_string(),
        MapKey::U32(n) => n.to_string(),
        MapKey::U64(n) => n.to_string(),
        MapKey::String(s) => s.clone(),
    }
}
