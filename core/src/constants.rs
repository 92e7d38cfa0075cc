//! Shared limits and defaults.

/// Longest varint that can carry a u64 length prefix.
pub const MAX_VARINT_LEN: usize = 10;

/// Positioned-read window used by the framer to pull length prefixes.
pub const HEADER_WINDOW_SIZE: usize = 64 * 1024; // 64 KiB

/// Records trial-decoded during schema inference.
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Defaults when the caller does not supply a parallelism profile
pub const DEFAULT_DECODE_WORKERS: usize = 30;
pub const DEFAULT_SERIALIZE_WORKERS: usize = 16;
pub const DEFAULT_INFLIGHT_RECORDS: usize = 1024;

/// Sanity bounds for user-supplied profiles.
pub const MAX_WORKERS: usize = 512;
pub const MAX_INFLIGHT_RECORDS: usize = 1 << 20;

/// Initial per-worker read buffer (grown on demand).
pub const DECODE_BUFFER_SIZE: usize = 256 * 1024; // 256 KiB

/// Output buffer in front of the sink.
pub const OUTPUT_BUFFER_SIZE: usize = 16 * 1024; // 16 KiB

/// Environment variable the CLI reads descriptor set paths from.
pub const DESCRIPTORS_ENV: &str = "PROTOSCAN_DESCRIPTORS";

/// Packages never offered as inference candidates.
pub const EXCLUDED_PACKAGE_PREFIXES: &[&str] = &["google.protobuf"];
