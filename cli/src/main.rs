//! protoscan CLI
//!
//! Dump a file of length-delimited protobuf records as newline-delimited
//! JSON without being told the message type.
//!
//! ```bash
//! protoc --include_imports --descriptor_set_out=schemas.pb -I protos protos/**/*.proto
//! export PROTOSCAN_DESCRIPTORS=schemas.pb
//!
//! protoscan events.bin                       # infer the type, print every record
//! protoscan --match 'user_id=^42$' events.bin
//! protoscan -c events.bin                    # count records
//! protoscan --msg acme.v1.Event -m 10 -      # explicit type, first 10 from stdin
//! ```
//!
//! Logs go to stderr and honor `RUST_LOG` (default `info`).

use std::io::{self, ErrorKind};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::debug;

use protoscan_core::constants::{
    DEFAULT_DECODE_WORKERS, DEFAULT_INFLIGHT_RECORDS, DEFAULT_SAMPLE_SIZE,
    DEFAULT_SERIALIZE_WORKERS, DESCRIPTORS_ENV,
};
use protoscan_core::schema::{ProtoRegistry, RenderStrategy};
use protoscan_core::stream::{scan, InputSource, MatchExpr, ParallelismProfile, ScanConfig};
use protoscan_core::types::StreamError;

#[derive(Parser, Debug)]
#[command(name = "protoscan")]
#[command(about = "Print length-delimited protobuf records as JSON lines, inferring their type", long_about = None)]
struct Cli {
    /// Input file; omit or pass `-` to read stdin
    file: Option<PathBuf>,

    /// Compiled descriptor set(s) (`protoc --descriptor_set_out`); repeat or comma-separate
    #[arg(short, long = "descriptors", env = DESCRIPTORS_ENV, value_delimiter = ',')]
    descriptors: Vec<PathBuf>,

    /// Only output records whose string field matches. Format: Field=regex
    #[arg(long = "match", value_name = "FIELD=REGEX")]
    match_expr: Option<MatchExpr>,

    /// Print the number of matching records instead of the records
    #[arg(short, long)]
    count: bool,

    /// Maximum number of records to output (0 = no limit)
    #[arg(short = 'm', long = "max", default_value_t = 0)]
    max: u64,

    /// Fully qualified message type; skips inference
    #[arg(long = "msg", value_name = "TYPE")]
    msg: Option<String>,

    /// JSON rendering: `fast` or `exact` (canonical protobuf JSON, slower)
    #[arg(long, default_value_t = RenderStrategy::Fast)]
    render: RenderStrategy,

    /// Records trial-decoded to infer the type
    #[arg(long, default_value_t = DEFAULT_SAMPLE_SIZE)]
    sample_size: usize,

    /// Decoder pool width
    #[arg(long, default_value_t = DEFAULT_DECODE_WORKERS)]
    decode_workers: usize,

    /// Serializer pool width
    #[arg(long, default_value_t = DEFAULT_SERIALIZE_WORKERS)]
    serialize_workers: usize,

    /// Size pools from the number of cores instead
    #[arg(long, conflicts_with_all = ["decode_workers", "serialize_workers"])]
    auto_workers: bool,

    /// Capacity of each inter-stage queue
    #[arg(long, default_value_t = DEFAULT_INFLIGHT_RECORDS)]
    inflight: usize,

    /// Print scan telemetry as JSON on stderr when done
    #[arg(long)]
    stats: bool,
}

impl Cli {
    fn input(&self) -> InputSource {
        match &self.file {
            Some(path) if path.as_os_str() != "-" => InputSource::File(path.clone()),
            _ => InputSource::Reader(Box::new(io::stdin())),
        }
    }

    fn scan_config(&self) -> ScanConfig {
        let profile = if self.auto_workers {
            ParallelismProfile::dynamic()
        } else {
            ParallelismProfile::default().with_workers(self.decode_workers, self.serialize_workers)
        };

        ScanConfig {
            match_expr: self.match_expr.clone(),
            max_output: Some(self.max),
            count_only: self.count,
            schema: self.msg.clone(),
            render: self.render,
            sample_size: self.sample_size,
            profile: ParallelismProfile {
                inflight: self.inflight,
                ..profile
            },
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if cli.descriptors.is_empty() {
        bail!(
            "no descriptor sets given.\n\
             Pass --descriptors/-d or set the environment variable {DESCRIPTORS_ENV}."
        );
    }

    let registry = ProtoRegistry::load(&cli.descriptors).with_context(|| {
        format!("failed to load descriptor sets from {:?}", cli.descriptors)
    })?;

    let config = cli.scan_config();
    let input = cli.input();
    let stdout = io::stdout();

    let snapshot = match scan(input, stdout.lock(), &registry, &config) {
        Ok(snapshot) => snapshot,
        // Downstream closed early (`| head`); not a failure.
        Err(StreamError::Write(e)) if e.kind() == ErrorKind::BrokenPipe => return Ok(()),
        Err(e) => return Err(e).context("scan failed"),
    };

    let stats = serde_json::to_string(&snapshot).context("failed to serialize telemetry")?;
    debug!(telemetry = %stats, "scan finished");
    if cli.stats {
        eprintln!("{stats}");
        eprintln!("stages: {}", snapshot.stage_times.summary());
    }

    Ok(())
}
