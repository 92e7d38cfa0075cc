use std::borrow::Cow;

use prost::Message as _;
use prost_reflect::{DynamicMessage, Value};

use crate::schema::render;
use crate::schema::types::{FieldError, Message, RenderStrategy, SchemaError};

/// Decoded protobuf message.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtoMessage {
    inner: DynamicMessage,
}

impl ProtoMessage {
    pub fn new(inner: DynamicMessage) -> Self {
        Self { inner }
    }
}

impl Message for ProtoMessage {
    fn unknown_field_count(&self) -> usize {
        count_unknown(&self.inner)
    }

    fn encoded_len_without_unknown(&self) -> usize {
        if count_unknown(&self.inner) == 0 {
            return self.inner.encoded_len();
        }
        let mut stripped = self.inner.clone();
        strip_unknown(&mut stripped);
        stripped.encoded_len()
    }

    fn string_field(&self, name: &str) -> Result<Cow<'_, str>, FieldError> {
        lookup_string(&self.inner, name, name)
    }

    fn render_json(&self, strategy: RenderStrategy, out: &mut Vec<u8>) -> Result<(), SchemaError> {
        match strategy {
            RenderStrategy::Fast => render::render_fast(&self.inner, out),
            RenderStrategy::Exact => render::render_exact(&self.inner, out),
        }
    }
}

// Unknown data counts at every nesting level, not just the root.
fn count_unknown(msg: &DynamicMessage) -> usize {
    msg.unknown_fields().count()
        + msg
            .fields()
            .map(|(_, value)| count_unknown_in_value(value))
            .sum::<usize>()
}

fn count_unknown_in_value(value: &Value) -> usize {
    match value {
        Value::Message(m) => count_unknown(m),
        Value::List(items) => items.iter().map(count_unknown_in_value).sum(),
        Value::Map(entries) => entries.values().map(count_unknown_in_value).sum(),
        _ => 0,
    }
}

fn strip_unknown(msg: &mut DynamicMessage) {
    msg.take_unknown_fields().for_each(drop);
    for (_, value) in msg.fields_mut() {
        strip_unknown_in_value(value);
    }
}

fn strip_unknown_in_value(value: &mut Value) {
    match value {
        Value::Message(m) => strip_unknown(m),
        Value::List(items) => items.iter_mut().for_each(strip_unknown_in_value),
        Value::Map(entries) => entries.values_mut().for_each(strip_unknown_in_value),
        _ => {}
    }
}

/// Resolve `path` (`a.b.c`) to a string value.
fn lookup_string<'a>(
    msg: &'a DynamicMessage,
    path: &str,
    full_path: &str,
) -> Result<Cow<'a, str>, FieldError> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };

    let value = msg
        .get_field_by_name(head)
        .ok_or_else(|| FieldError::NotFound(full_path.to_owned()))?;

    match (value, rest) {
        (Cow::Borrowed(Value::String(s)), None) => Ok(Cow::Borrowed(s.as_str())),
        (Cow::Owned(Value::String(s)), None) => Ok(Cow::Owned(s)),
        (Cow::Borrowed(Value::Message(inner)), Some(rest)) => lookup_string(inner, rest, full_path),
        (Cow::Owned(Value::Message(inner)), Some(rest)) => {
            lookup_string(&inner, rest, full_path).map(|s| Cow::Owned(s.into_owned()))
        }
        (_, Some(_)) => Err(FieldError::NotFound(full_path.to_owned())),
        (other, None) => Err(FieldError::NotString {
            field: full_path.to_owned(),
            kind: value_kind(&other).to_owned(),
        }),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "bool",
        Value::I32(_) => "int32",
        Value::I64(_) => "int64",
        Value::U32(_) => "uint32",
        Value::U64(_) => "uint64",
        Value::F32(_) => "float",
        Value::F64(_) => "double",
        Value::String(_) => "string",
        Value::Bytes(_) => "bytes",
        Value::EnumNumber(_) => "enum",
        Value::Message(_) => "message",
        Value::List(_) => "list",
        Value::Map(_) => "map",
    }
}
