//! stream/pipeline.rs
//! Pipeline wiring: framer → decoders → filter → serializers → writer.

use std::io::Write;
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

use crossbeam::channel::{bounded, Sender};
use tracing::{debug, error};

use crate::framing::{RecordFramer, RecordLocation};
use crate::schema::{RenderStrategy, Schema};
use crate::stream::cancel::{recv_or_cancel, send_or_cancel, Shutdown};
use crate::stream::decode_worker::DecodeWorker;
use crate::stream::io::{DocumentWriter, RecordSource};
use crate::stream::match_filter::{MatchExpr, MatchFilter};
use crate::stream::parallelism::ParallelismProfile;
use crate::stream::serialize_worker::SerializeWorker;
use crate::stream::types::{DecodedRecord, RenderedDocument, StageReport};
use crate::telemetry::Stage;
use crate::types::StreamError;

/// Everything the pipeline needs besides the source, schema and sink.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub profile: ParallelismProfile,
    pub match_expr: Option<MatchExpr>,
    /// `None` or `Some(0)` means unbounded.
    pub max_output: Option<u64>,
    pub count_only: bool,
    pub render: RenderStrategy,
}

impl PipelineConfig {
    fn cap(&self) -> Option<u64> {
        self.max_output.filter(|m| *m > 0)
    }
}

/// Decode every record of `source` with `schema` and write the result to
/// `sink`: one JSON document per admitted message, or a single integer in
/// count mode.
///
/// Returns the merged stage reports. On a fatal error the first one
/// recorded is returned and buffered documents are discarded; only
/// documents already flushed (one per match when filtering) reach `sink`.
pub fn run_scan_pipeline<Sch, Src, W>(
    source: &Src,
    schema: Sch,
    sink: W,
    config: &PipelineConfig,
) -> Result<StageReport, StreamError>
where
    Sch: Schema,
    Src: RecordSource + ?Sized,
    W: Write,
{
    config.profile.validate()?;

    // Each matched document goes out immediately when filtering.
    let mut writer = DocumentWriter::new(sink, config.match_expr.is_some());

    if config.count_only && config.match_expr.is_none() {
        let report = count_records(source, config.cap())?;
        writer
            .write_count(report.counters.records_emitted)
            .map_err(StreamError::Write)?;
        writer.finish().map_err(StreamError::Write)?;
        return Ok(report);
    }

    let shutdown = Shutdown::new();
    let profile = &config.profile;

    // Without a predicate every decoded record is emitted, so the framer can
    // stop at the cap as well.
    let framer_limit = if config.match_expr.is_none() { config.cap() } else { None };

    let (loc_tx, loc_rx) = bounded::<RecordLocation>(profile.inflight);
    let (dec_tx, dec_rx) = bounded::<DecodedRecord<Sch::Message>>(profile.inflight);

    debug!(
        schema = schema.id(),
        decode_workers = profile.decode_workers,
        serialize_workers = profile.serialize_workers,
        inflight = profile.inflight,
        count_only = config.count_only,
        "starting scan pipeline"
    );

    let mut report = thread::scope(|scope| {
        let shutdown = &shutdown;
        let mut handles: Vec<ScopedJoinHandle<'_, StageReport>> = Vec::new();
        let mut local = StageReport::default();

        // ---- Framer ----
        handles.push(scope.spawn(move || run_framer(source, framer_limit, loc_tx, shutdown)));

        // ---- Decoder pool ----
        for i in 0..profile.decode_workers {
            let worker = DecodeWorker::new(i, schema.clone(), source);
            let rx = loc_rx.clone();
            let tx = dec_tx.clone();
            handles.push(scope.spawn(move || worker.run(rx, tx, shutdown)));
        }
        drop(loc_rx);
        drop(dec_tx);

        let filter = MatchFilter::new(config.match_expr.clone(), config.cap());

        if config.count_only {
            // ---- Filter on the calling thread, counting only ----
            local.merge(&filter.run(dec_rx, None, shutdown));
        } else {
            let (match_tx, match_rx) = bounded::<DecodedRecord<Sch::Message>>(profile.inflight);
            let (doc_tx, doc_rx) = bounded::<RenderedDocument>(profile.inflight);

            // ---- Filter ----
            handles.push(scope.spawn(move || filter.run(dec_rx, Some(match_tx), shutdown)));

            // ---- Serializer pool ----
            for i in 0..profile.serialize_workers {
                let worker = SerializeWorker::new(i, config.render);
                let rx = match_rx.clone();
                let tx = doc_tx.clone();
                handles.push(scope.spawn(move || worker.run(rx, tx, shutdown)));
            }
            drop(match_rx);
            drop(doc_tx);

            // ---- Writer ----
            while let Some(doc) = recv_or_cancel(&doc_rx, &shutdown.abort) {
                if shutdown.is_aborted() {
                    break;
                }
                let start = Instant::now();
                if let Err(e) = writer.write_document(&doc.json) {
                    error!(offset = doc.offset, "output write failed");
                    shutdown.fail(StreamError::Write(e));
                    break;
                }
                local.counters.add_emitted();
                local.stage_times.add(Stage::Write, start.elapsed());
            }
            drop(doc_rx);
        }

        for handle in handles {
            match handle.join() {
                Ok(stage) => local.merge(&stage),
                Err(_) => shutdown.fail(StreamError::Pipeline("stage thread panicked")),
            }
        }
        local
    });

    if let Some(err) = shutdown.take_error() {
        writer.discard();
        return Err(err);
    }

    if config.count_only {
        report.counters.records_emitted = report.counters.records_matched;
        writer
            .write_count(report.counters.records_emitted)
            .map_err(StreamError::Write)?;
    }
    writer.finish().map_err(StreamError::Write)?;

    debug!(
        scanned = report.counters.records_scanned,
        decoded = report.counters.records_decoded,
        matched = report.counters.records_matched,
        emitted = report.counters.records_emitted,
        "scan pipeline finished"
    );
    Ok(report)
}

/// Framer stage: emits locations in file order until EOF, the limit, or
/// `stop`.
fn run_framer<Src: RecordSource + ?Sized>(
    source: &Src,
    limit: Option<u64>,
    tx: Sender<RecordLocation>,
    shutdown: &Shutdown,
) -> StageReport {
    let start = Instant::now();
    let mut report = StageReport::default();

    for item in RecordFramer::with_limit(source, limit) {
        match item {
            Ok(loc) => {
                report.counters.add_scanned();
                if send_or_cancel(&tx, loc, &shutdown.stop).is_err() {
                    break;
                }
            }
            Err(e) => {
                shutdown.fail(e.into());
                break;
            }
        }
    }

    report.stage_times.add(Stage::Scan, start.elapsed());
    debug!(scanned = report.counters.records_scanned, "framer finished");
    report
}

/// Count-only fast path: count framed records without decoding them.
pub fn count_records<Src: RecordSource + ?Sized>(
    source: &Src,
    limit: Option<u64>,
) -> Result<StageReport, StreamError> {
    let start = Instant::now();
    let mut report = StageReport::default();

    for item in RecordFramer::with_limit(source, limit) {
        item?;
        report.counters.add_scanned();
    }

    let n = report.counters.records_scanned;
    report.counters.records_matched = n;
    report.counters.records_emitted = n;
    report.stage_times.add(Stage::Scan, start.elapsed());
    Ok(report)
}
