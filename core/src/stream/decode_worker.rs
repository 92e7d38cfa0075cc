//! stream/decode_worker.rs
//! Positioned read + decode of confirmed records.

use std::time::Instant;

use crossbeam::channel::{Receiver, Sender};
use tracing::{debug, error};

use crate::constants::DECODE_BUFFER_SIZE;
use crate::framing::RecordLocation;
use crate::schema::Schema;
use crate::stream::cancel::{recv_or_cancel, send_or_cancel, Shutdown};
use crate::stream::io::RecordSource;
use crate::stream::types::{DecodedRecord, StageReport};
use crate::telemetry::Stage;
use crate::types::StreamError;

/// One member of the decoder pool.
///
/// Owns a read buffer that is reused for every record and grown on demand.
pub struct DecodeWorker<'a, S: Schema, Src: RecordSource + ?Sized> {
    id: usize,
    schema: S,
    source: &'a Src,
    buf: Vec<u8>,
    report: StageReport,
}

impl<'a, S: Schema, Src: RecordSource + ?Sized> DecodeWorker<'a, S, Src> {
    pub fn new(id: usize, schema: S, source: &'a Src) -> Self {
        Self {
            id,
            schema,
            source,
            buf: Vec::with_capacity(DECODE_BUFFER_SIZE),
            report: StageReport::default(),
        }
    }

    /// Read and decode the record at `loc`.
    ///
    /// Any failure is fatal for the scan: the schema was confirmed on a
    /// sample, so a record that does not decode means corruption or a wrong
    /// inference.
    pub fn decode(&mut self, loc: &RecordLocation) -> Result<S::Message, StreamError> {
        let start = Instant::now();

        self.buf.clear();
        self.buf.resize(loc.len(), 0);
        self.source
            .read_exact_at(&mut self.buf, loc.offset)
            .map_err(|source| StreamError::Read {
                offset: loc.offset,
                source,
            })?;

        let message = self
            .schema
            .decode(&self.buf)
            .map_err(|source| StreamError::Decode {
                offset: loc.offset,
                length: loc.length,
                schema: self.schema.id().to_owned(),
                source,
            })?;

        self.report.counters.add_decoded(loc.len());
        self.report.stage_times.add(Stage::Decode, start.elapsed());
        Ok(message)
    }

    /// Run loop: consumes locations, emits decoded messages.
    ///
    /// Exits when the location channel closes, when `stop` fires, or on the
    /// first decode failure (which aborts the whole scan).
    pub fn run(
        mut self,
        rx: Receiver<RecordLocation>,
        tx: Sender<DecodedRecord<S::Message>>,
        shutdown: &Shutdown,
    ) -> StageReport {
        debug!(worker = self.id, "decode worker started");

        while let Some(loc) = recv_or_cancel(&rx, &shutdown.stop) {
            let message = match self.decode(&loc) {
                Ok(m) => m,
                Err(e) => {
                    error!(worker = self.id, offset = loc.offset, "decode failed");
                    shutdown.fail(e);
                    break;
                }
            };

            let record = DecodedRecord {
                offset: loc.offset,
                message,
            };
            if send_or_cancel(&tx, record, &shutdown.stop).is_err() {
                break;
            }
        }

        debug!(
            worker = self.id,
            decoded = self.report.counters.records_decoded,
            "decode worker finished"
        );
        self.report
    }
}
