use std::io;
use thiserror::Error;

/// Payload span of one length-prefixed record.
///
/// `offset` points at the first payload byte; the varint prefix occupies the
/// `header_len` bytes right before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordLocation {
    pub offset: u64,
    pub length: u64,
    pub header_len: u8,
}

impl RecordLocation {
    /// Offset of the varint prefix that introduced this record.
    #[inline]
    pub fn header_offset(&self) -> u64 {
        self.offset - self.header_len as u64
    }

    /// First byte after the payload, i.e. where the next prefix starts.
    #[inline]
    pub fn end(&self) -> u64 {
        self.offset + self.length
    }

    /// Payload length as a buffer size.
    #[inline]
    pub fn len(&self) -> usize {
        self.length as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VarintError {
    /// Input ended before the terminating byte.
    #[error("truncated varint")]
    Truncated,
    /// More than ten bytes, or bits beyond u64 set in the tenth.
    #[error("varint overflows 64 bits")]
    Overflow,
}

#[derive(Debug, Error)]
pub enum FramingError {
    #[error("I/O error while scanning at offset {offset}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: io::Error,
    },
}
