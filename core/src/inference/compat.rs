use crate::schema::{Message, Schema};

/// Does `schema` account for every byte of `bytes`, exactly?
///
/// Holds iff the payload decodes, leaves no unknown fields behind (at any
/// nesting level), and re-encodes to the original length once unknowns are
/// stripped. Protobuf is loose enough that unrelated types often decode
/// without error; the size check rejects those.
pub fn structurally_compatible<S: Schema>(schema: &S, bytes: &[u8]) -> bool {
    let msg = match schema.decode(bytes) {
        Ok(msg) => msg,
        Err(_) => return false,
    };

    if msg.unknown_field_count() != 0 {
        return false;
    }

    msg.encoded_len_without_unknown() == bytes.len()
}
