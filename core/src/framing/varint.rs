use crate::constants::MAX_VARINT_LEN;
use crate::framing::types::VarintError;

/// Decode a base-128 varint from the front of `buf`.
///
/// Returns the value and the number of bytes consumed.
#[inline]
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize), VarintError> {
    let mut value: u64 = 0;

    for (i, &byte) in buf.iter().take(MAX_VARINT_LEN).enumerate() {
        let low = (byte & 0x7F) as u64;

        // the tenth byte may only contribute the top bit of a u64
        if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
            return Err(VarintError::Overflow);
        }

        value |= low << (7 * i);

        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    if buf.len() >= MAX_VARINT_LEN {
        Err(VarintError::Overflow)
    } else {
        Err(VarintError::Truncated)
    }
}

/// Append `value` as a varint to `out`, returning the encoded size.
pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) -> usize {
    let start = out.len();
    while value >= 0x80 {
        out.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
    out.len() - start
}

/// Encoded size of `value` without writing it.
#[inline]
pub fn varint_len(value: u64) -> usize {
    // 1 byte per started 7-bit group, minimum one
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}
