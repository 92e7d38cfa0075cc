use tracing::{debug, warn};

use crate::constants::{HEADER_WINDOW_SIZE, MAX_VARINT_LEN};
use crate::framing::types::{FramingError, RecordLocation, VarintError};
use crate::framing::varint::decode_varint;
use crate::stream::io::RecordSource;

/// Lazy scanner over `[varint length][payload]` records.
///
/// Yields locations in file order starting at offset 0. The sequence ends
/// quietly at EOF, at a truncated trailing record, or once `limit` records
/// have been produced. Only I/O failures surface as errors.
pub struct RecordFramer<'a, S: RecordSource + ?Sized> {
    source: &'a S,
    file_len: u64,
    cursor: u64,
    emitted: u64,
    limit: Option<u64>,
    window: Vec<u8>,
    window_start: u64,
    done: bool,
}

impl<'a, S: RecordSource + ?Sized> RecordFramer<'a, S> {
    /// Scan the whole source.
    pub fn new(source: &'a S) -> Self {
        Self::with_limit(source, None)
    }

    /// Scan at most `limit` records. `Some(0)` is treated as unbounded.
    pub fn with_limit(source: &'a S, limit: Option<u64>) -> Self {
        Self {
            source,
            file_len: source.len(),
            cursor: 0,
            emitted: 0,
            limit: limit.filter(|n| *n > 0),
            window: Vec::new(),
            window_start: 0,
            done: false,
        }
    }

    /// Records produced so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Offset of the next length prefix (bytes consumed so far).
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// Advance to the next record.
    pub fn next_record(&mut self) -> Result<Option<RecordLocation>, FramingError> {
        if self.done {
            return Ok(None);
        }
        if self.limit.is_some_and(|limit| self.emitted >= limit) {
            self.done = true;
            return Ok(None);
        }
        if self.cursor >= self.file_len {
            self.done = true;
            return Ok(None);
        }

        let (header, available) = match self.header_bytes() {
            Ok(h) => h,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };

        let (length, header_len) = match decode_varint(&header[..available]) {
            Ok(v) => v,
            Err(VarintError::Truncated) => {
                debug!(offset = self.cursor, "truncated length prefix at end of input");
                self.done = true;
                return Ok(None);
            }
            Err(VarintError::Overflow) => {
                warn!(offset = self.cursor, "malformed length prefix, stopping scan");
                self.done = true;
                return Ok(None);
            }
        };

        let offset = self.cursor + header_len as u64;
        let end = match offset.checked_add(length) {
            Some(end) if end <= self.file_len => end,
            _ => {
                debug!(
                    offset = self.cursor,
                    length,
                    file_len = self.file_len,
                    "partial trailing record, stopping scan"
                );
                self.done = true;
                return Ok(None);
            }
        };

        self.cursor = end;
        self.emitted += 1;

        Ok(Some(RecordLocation {
            offset,
            length,
            header_len: header_len as u8,
        }))
    }

    /// Up to `MAX_VARINT_LEN` bytes at the cursor, never past EOF.
    fn header_bytes(&mut self) -> Result<([u8; MAX_VARINT_LEN], usize), FramingError> {
        let want = (self.file_len - self.cursor).min(MAX_VARINT_LEN as u64) as usize;
        let window_end = self.window_start + self.window.len() as u64;

        let covered = self.cursor >= self.window_start && self.cursor + want as u64 <= window_end;
        if !covered {
            let fill = (self.file_len - self.cursor).min(HEADER_WINDOW_SIZE as u64) as usize;
            self.window.resize(fill, 0);
            self.source
                .read_exact_at(&mut self.window, self.cursor)
                .map_err(|source| FramingError::Io {
                    offset: self.cursor,
                    source,
                })?;
            self.window_start = self.cursor;
        }

        let start = (self.cursor - self.window_start) as usize;
        let mut header = [0u8; MAX_VARINT_LEN];
        header[..want].copy_from_slice(&self.window[start..start + want]);
        Ok((header, want))
    }
}

impl<S: RecordSource + ?Sized> Iterator for RecordFramer<'_, S> {
    type Item = Result<RecordLocation, FramingError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Collect the first `n` record locations (the inference sample).
pub fn collect_sample<S: RecordSource + ?Sized>(
    source: &S,
    n: usize,
) -> Result<Vec<RecordLocation>, FramingError> {
    if n == 0 {
        return Ok(Vec::new());
    }
    RecordFramer::with_limit(source, Some(n as u64)).collect()
}
