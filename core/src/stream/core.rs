//! stream/core.rs
//! Stable public API: scan configuration and entry points.

use std::io::Write;
use std::time::Instant;

use tracing::info;

use crate::constants::DEFAULT_SAMPLE_SIZE;
use crate::inference::{infer_schema, resolve_explicit, Inference};
use crate::schema::{RenderStrategy, SchemaId, SchemaRegistry};
use crate::stream::io::{open_input, InputSource, RecordSource};
use crate::stream::match_filter::MatchExpr;
use crate::stream::parallelism::ParallelismProfile;
use crate::stream::pipeline::{run_scan_pipeline, PipelineConfig};
use crate::telemetry::{ScanSnapshot, ScanTimer, Stage};
use crate::types::StreamError;

/// Configuration for one scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Only emit records whose field matches.
    pub match_expr: Option<MatchExpr>,
    /// Cap on emitted records; `None` or `Some(0)` means unbounded.
    pub max_output: Option<u64>,
    /// Print the number of admitted records instead of documents.
    pub count_only: bool,
    /// Skip inference and decode with this message type.
    pub schema: Option<SchemaId>,
    pub render: RenderStrategy,
    /// Records trial-decoded during inference.
    pub sample_size: usize,
    pub profile: ParallelismProfile,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            match_expr: None,
            max_output: None,
            count_only: false,
            schema: None,
            render: RenderStrategy::default(),
            sample_size: DEFAULT_SAMPLE_SIZE,
            profile: ParallelismProfile::default(),
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.sample_size == 0 {
            return Err(StreamError::Validation("sample size must be at least 1".into()));
        }
        if self.schema.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(StreamError::Validation("explicit message type is empty".into()));
        }
        self.profile.validate()
    }

    fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            profile: self.profile.clone(),
            match_expr: self.match_expr.clone(),
            max_output: self.max_output,
            count_only: self.count_only,
            render: self.render,
        }
    }
}

/// Scan `input` and write newline-delimited JSON (or a count) to `sink`.
pub fn scan<R, W>(
    input: InputSource,
    sink: W,
    registry: &R,
    config: &ScanConfig,
) -> Result<ScanSnapshot, StreamError>
where
    R: SchemaRegistry,
    W: Write,
{
    config.validate()?;
    let source = open_input(input)?;
    scan_source(source.as_ref(), sink, registry, config)
}

/// Same as [`scan`] over an already-open source.
pub fn scan_source<R, Src, W>(
    source: &Src,
    sink: W,
    registry: &R,
    config: &ScanConfig,
) -> Result<ScanSnapshot, StreamError>
where
    R: SchemaRegistry,
    Src: RecordSource + ?Sized,
    W: Write,
{
    config.validate()?;
    let mut timer = ScanTimer::new();

    let start = Instant::now();
    let inference = determine_schema(source, registry, config)?;
    timer.add_stage_time(Stage::Infer, start.elapsed());

    let schema = registry.resolve(&inference.schema)?;
    let report = run_scan_pipeline(source, schema, sink, &config.pipeline())?;

    timer.stage_times.merge(&report.stage_times);
    timer.finish();

    Ok(ScanSnapshot::new(
        inference.schema,
        inference.resolution,
        &report.counters,
        &timer,
    ))
}

/// Explicit type when configured, structural inference otherwise.
pub fn determine_schema<R, Src>(
    source: &Src,
    registry: &R,
    config: &ScanConfig,
) -> Result<Inference, StreamError>
where
    R: SchemaRegistry,
    Src: RecordSource + ?Sized,
{
    if let Some(id) = &config.schema {
        return Ok(resolve_explicit(registry, id)?);
    }

    let candidates = registry.candidates();
    let inference = infer_schema(registry, source, &candidates, config.sample_size)?;
    info!(schema = %inference.schema, resolution = ?inference.resolution, "inferred type");
    Ok(inference)
}
