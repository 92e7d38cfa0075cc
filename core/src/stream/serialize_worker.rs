//! stream/serialize_worker.rs
//! Matched message → one JSON document.

use std::time::Instant;

use crossbeam::channel::{Receiver, Sender};
use tracing::debug;

use crate::schema::{Message, RenderStrategy};
use crate::stream::cancel::{recv_or_cancel, send_or_cancel, Shutdown};
use crate::stream::types::{DecodedRecord, RenderedDocument, StageReport};
use crate::telemetry::Stage;
use crate::types::StreamError;

pub struct SerializeWorker {
    id: usize,
    strategy: RenderStrategy,
    report: StageReport,
}

impl SerializeWorker {
    pub fn new(id: usize, strategy: RenderStrategy) -> Self {
        Self {
            id,
            strategy,
            report: StageReport::default(),
        }
    }

    pub fn render<M: Message>(&mut self, record: &DecodedRecord<M>) -> Result<RenderedDocument, StreamError> {
        let start = Instant::now();
        let mut json = Vec::new();
        record
            .message
            .render_json(self.strategy, &mut json)
            .map_err(|source| StreamError::Render {
                offset: record.offset,
                source,
            })?;

        self.report.counters.add_rendered(json.len());
        self.report.stage_times.add(Stage::Render, start.elapsed());
        Ok(RenderedDocument {
            offset: record.offset,
            json,
        })
    }

    /// Run loop: consumes matched messages, emits rendered documents.
    /// Only `abort` interrupts it; admitted messages are always rendered.
    pub fn run<M: Message>(
        mut self,
        rx: Receiver<DecodedRecord<M>>,
        tx: Sender<RenderedDocument>,
        shutdown: &Shutdown,
    ) -> StageReport {
        debug!(worker = self.id, strategy = %self.strategy, "serialize worker started");

        while let Some(record) = recv_or_cancel(&rx, &shutdown.abort) {
            let doc = match self.render(&record) {
                Ok(doc) => doc,
                Err(e) => {
                    shutdown.fail(e);
                    break;
                }
            };
            if send_or_cancel(&tx, doc, &shutdown.abort).is_err() {
                break;
            }
        }

        debug!(worker = self.id, "serialize worker finished");
        self.report
    }
}
