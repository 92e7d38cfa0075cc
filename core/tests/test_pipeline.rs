// End-to-end scans:
// * every record emitted exactly once, for any pool width
// * caps with and without a predicate
// * count-only mode (fast path and predicate path)
// * fatal errors: decode failure, inference failure, sink failure
// * telemetry agrees with the output

mod common;

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::io::{self, Write};
    use std::time::{Duration, Instant};

    use protoscan_core::inference::{InferenceError, Resolution};
    use protoscan_core::schema::RenderStrategy;
    use protoscan_core::stream::{scan, InputSource, MatchExpr, ParallelismProfile, ScanConfig};
    use protoscan_core::types::StreamError;

    use crate::common::*;

    fn heartbeat_data(n: usize) -> Vec<u8> {
        framed(&heartbeats(&heartbeat_registry(), n))
    }

    fn memory(bytes: Vec<u8>) -> InputSource {
        InputSource::Memory { bytes, name: None }
    }

    fn profile(workers: usize) -> ParallelismProfile {
        ParallelismProfile {
            decode_workers: workers,
            serialize_workers: workers,
            inflight: 8,
        }
    }

    fn run(bytes: Vec<u8>, config: &ScanConfig) -> Result<(Vec<u8>, protoscan_core::telemetry::ScanSnapshot), StreamError> {
        let registry = heartbeat_registry();
        let mut out = Vec::new();
        let snapshot = scan(memory(bytes), &mut out, &registry, config)?;
        Ok((out, snapshot))
    }

    fn hosts(out: &[u8]) -> Vec<String> {
        json_lines(out)
            .into_iter()
            .map(|doc| doc["host"].as_str().unwrap().to_owned())
            .collect()
    }

    // ------------------------------------------------------------
    // Full scans
    // ------------------------------------------------------------

    #[test]
    fn every_record_is_emitted_once_for_any_width() {
        let expected: BTreeSet<String> = (0..200).map(|i| format!("host-{i}")).collect();

        for workers in [1, 2, 8, 30] {
            let config = ScanConfig { profile: profile(workers), ..Default::default() };
            let (out, snapshot) = run(heartbeat_data(200), &config).unwrap();

            let got = hosts(&out);
            assert_eq!(got.len(), 200, "workers={workers}");
            assert_eq!(got.into_iter().collect::<BTreeSet<_>>(), expected);

            assert_eq!(snapshot.schema, full("Heartbeat"));
            assert_eq!(snapshot.resolution, Resolution::Structural);
            assert_eq!(snapshot.emitted(), 200);
            assert_eq!(snapshot.counters.records_scanned, 200);
            assert_eq!(snapshot.counters.records_decoded, 200);
            assert!(snapshot.sanity_check());
        }
    }

    #[test]
    fn documents_carry_decoded_values() {
        let config = ScanConfig { profile: ParallelismProfile::single_threaded(), ..Default::default() };
        let (out, _) = run(heartbeat_data(1), &config).unwrap();
        assert_eq!(out, b"{\"host\":\"host-0\",\"seq\":1}\n".to_vec());
    }

    #[test]
    fn exact_rendering_through_the_pipeline() {
        let config = ScanConfig {
            render: RenderStrategy::Exact,
            profile: ParallelismProfile::single_threaded(),
            ..Default::default()
        };
        let (out, _) = run(heartbeat_data(1), &config).unwrap();
        assert_eq!(out, b"{\"host\":\"host-0\",\"seq\":\"1\"}\n".to_vec());
    }

    #[test]
    fn truncated_trailing_record_is_ignored() {
        let mut bytes = heartbeat_data(5);
        bytes.extend_from_slice(&[0x20, b'x']);

        let (out, _) = run(bytes, &ScanConfig::default()).unwrap();
        assert_eq!(json_lines(&out).len(), 5);
    }

    #[test]
    fn empty_input_with_explicit_type_emits_nothing() {
        let config = ScanConfig { schema: Some(full("Heartbeat")), ..Default::default() };
        let (out, snapshot) = run(Vec::new(), &config).unwrap();
        assert!(out.is_empty());
        assert_eq!(snapshot.resolution, Resolution::Explicit);
        assert_eq!(snapshot.emitted(), 0);
    }

    // ------------------------------------------------------------
    // Caps and predicates
    // ------------------------------------------------------------

    #[test]
    fn cap_without_predicate_emits_min_of_cap_and_total() {
        for workers in [1, 4, 30] {
            for (cap, expected) in [(7u64, 7usize), (50, 50), (500, 100)] {
                let config = ScanConfig {
                    max_output: Some(cap),
                    profile: profile(workers),
                    ..Default::default()
                };
                let (out, snapshot) = run(heartbeat_data(100), &config).unwrap();
                assert_eq!(json_lines(&out).len(), expected, "cap={cap} workers={workers}");
                assert_eq!(snapshot.emitted(), expected as u64);
            }
        }
    }

    #[test]
    fn predicate_with_cap_emits_only_matches() {
        let matching = (0..300).filter(|i| i.to_string().contains('7')).count();
        assert!(matching > 5);

        for workers in [1, 8] {
            let config = ScanConfig {
                match_expr: Some("host=7".parse().unwrap()),
                max_output: Some(5),
                profile: profile(workers),
                ..Default::default()
            };
            let (out, _) = run(heartbeat_data(300), &config).unwrap();

            let got = hosts(&out);
            assert_eq!(got.len(), 5);
            assert!(got.iter().all(|h| h.contains('7')));
        }
    }

    #[test]
    fn predicate_without_cap_emits_every_match() {
        let expected: BTreeSet<String> = (0..300)
            .filter(|i| i.to_string().contains('7'))
            .map(|i| format!("host-{i}"))
            .collect();

        let config = ScanConfig {
            match_expr: Some("host=7".parse().unwrap()),
            profile: profile(4),
            ..Default::default()
        };
        let (out, snapshot) = run(heartbeat_data(300), &config).unwrap();
        assert_eq!(hosts(&out).into_iter().collect::<BTreeSet<_>>(), expected);
        assert_eq!(snapshot.counters.records_matched, expected.len() as u64);
    }

    #[test]
    fn missing_predicate_field_skips_everything() {
        let config = ScanConfig {
            match_expr: Some("hostname=.*".parse().unwrap()),
            ..Default::default()
        };
        let (out, snapshot) = run(heartbeat_data(20), &config).unwrap();
        assert!(out.is_empty());
        assert_eq!(snapshot.counters.field_misses, 20);
    }

    #[test]
    fn small_cap_on_large_input_terminates() {
        let config = ScanConfig {
            max_output: Some(1),
            match_expr: Some(MatchExpr::new("host", "^host-").unwrap()),
            profile: ParallelismProfile { decode_workers: 16, serialize_workers: 4, inflight: 1 },
            ..Default::default()
        };

        let start = Instant::now();
        let (out, _) = run(heartbeat_data(20_000), &config).unwrap();
        assert_eq!(json_lines(&out).len(), 1);
        assert!(start.elapsed() < Duration::from_secs(30));
    }

    // ------------------------------------------------------------
    // Count-only
    // ------------------------------------------------------------

    #[test]
    fn count_without_predicate() {
        let config = ScanConfig { count_only: true, ..Default::default() };
        let (out, snapshot) = run(heartbeat_data(123), &config).unwrap();
        assert_eq!(out, b"123\n".to_vec());
        assert_eq!(snapshot.counters.records_decoded, 0);

        let capped = ScanConfig { count_only: true, max_output: Some(10), ..Default::default() };
        let (out, _) = run(heartbeat_data(123), &capped).unwrap();
        assert_eq!(out, b"10\n".to_vec());
    }

    #[test]
    fn count_with_predicate_is_width_invariant() {
        let expected = (0..300).filter(|i| i.to_string().contains('7')).count();

        for workers in [1, 2, 8, 30] {
            let config = ScanConfig {
                count_only: true,
                match_expr: Some("host=7".parse().unwrap()),
                profile: profile(workers),
                ..Default::default()
            };
            let (out, snapshot) = run(heartbeat_data(300), &config).unwrap();
            assert_eq!(out, format!("{expected}\n").into_bytes(), "workers={workers}");
            assert_eq!(snapshot.emitted(), expected as u64);
        }
    }

    #[test]
    fn count_of_empty_input() {
        let config = ScanConfig {
            count_only: true,
            schema: Some(full("Beacon")),
            ..Default::default()
        };
        let (out, _) = run(Vec::new(), &config).unwrap();
        assert_eq!(out, b"0\n".to_vec());
    }

    // ------------------------------------------------------------
    // Inference via file name
    // ------------------------------------------------------------

    #[test]
    fn file_input_uses_its_name_to_break_ties() {
        let registry = twin_registry();
        let (_dir, path) = write_temp("probe-dump.bin", &framed(&heartbeats(&registry, 4)));

        let mut out = Vec::new();
        let snapshot = scan(InputSource::File(path), &mut out, &registry, &ScanConfig::default()).unwrap();
        assert_eq!(snapshot.schema, full("Probe"));
        assert_eq!(snapshot.resolution, Resolution::FileName);
        assert_eq!(json_lines(&out).len(), 4);
    }

    #[test]
    fn stdin_like_reader_is_spooled() {
        let registry = heartbeat_registry();
        let bytes = heartbeat_data(3);

        let mut out = Vec::new();
        let input = InputSource::Reader(Box::new(io::Cursor::new(bytes)));
        scan(input, &mut out, &registry, &ScanConfig::default()).unwrap();
        assert_eq!(json_lines(&out).len(), 3);
    }

    // ------------------------------------------------------------
    // Fatal errors
    // ------------------------------------------------------------

    #[test]
    fn decode_failure_after_confirmation_is_fatal() {
        let mut bytes = heartbeat_data(5);
        bytes.extend(framed_raw(&[&[0xff, 0xff, 0xff]]));
        bytes.extend(heartbeat_data(5));

        for workers in [1, 8] {
            let config = ScanConfig {
                schema: Some(full("Heartbeat")),
                profile: profile(workers),
                ..Default::default()
            };
            let registry = heartbeat_registry();
            let mut out = Vec::new();
            let err = scan(memory(bytes.clone()), &mut out, &registry, &config).unwrap_err();
            match err {
                StreamError::Decode { schema, length, .. } => {
                    assert_eq!(schema, full("Heartbeat"));
                    assert_eq!(length, 3);
                }
                other => panic!("expected decode error, got {other:?}"),
            }
            // Buffered output from before the failure is dropped, not flushed.
            assert!(out.is_empty(), "fatal run wrote {} bytes", out.len());
        }
    }

    #[test]
    fn fatal_error_discards_buffered_documents() {
        let mut bytes = heartbeat_data(5);
        bytes.extend(framed_raw(&[&[0xff, 0xff, 0xff]]));

        let config = ScanConfig {
            schema: Some(full("Heartbeat")),
            profile: ParallelismProfile::single_threaded(),
            ..Default::default()
        };
        let registry = heartbeat_registry();
        let mut out = Vec::new();
        let result = scan(memory(bytes), &mut out, &registry, &config);

        assert!(matches!(result, Err(StreamError::Decode { .. })));
        assert!(out.is_empty(), "fatal run wrote {} bytes", out.len());
    }

    #[test]
    fn inference_failure_is_fatal() {
        let bytes = framed_raw(&[&[0xff, 0xff, 0xff]]);
        let err = run(bytes, &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, StreamError::Inference(InferenceError::NoMatch { .. })));
    }

    #[test]
    fn unknown_explicit_type_is_fatal() {
        let config = ScanConfig { schema: Some(full("Ghost")), ..Default::default() };
        let err = run(heartbeat_data(1), &config).unwrap_err();
        assert!(matches!(err, StreamError::Schema(_)));
    }

    #[test]
    fn missing_file_is_fatal() {
        let registry = heartbeat_registry();
        let err = scan(
            InputSource::File("/definitely/not/here.bin".into()),
            Vec::new(),
            &registry,
            &ScanConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StreamError::Open { .. }));
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let zero_workers = ScanConfig { profile: profile(0), ..Default::default() };
        assert!(matches!(run(heartbeat_data(1), &zero_workers), Err(StreamError::Validation(_))));

        let zero_sample = ScanConfig { sample_size: 0, ..Default::default() };
        assert!(matches!(run(heartbeat_data(1), &zero_sample), Err(StreamError::Validation(_))));
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"))
        }
    }

    #[test]
    fn sink_failure_is_fatal() {
        let registry = heartbeat_registry();
        for match_expr in [None, Some("host=.".parse::<MatchExpr>().unwrap())] {
            let config = ScanConfig { match_expr, profile: profile(4), ..Default::default() };
            let err = scan(memory(heartbeat_data(2_000)), BrokenSink, &registry, &config).unwrap_err();
            assert!(matches!(err, StreamError::Write(e) if e.kind() == io::ErrorKind::BrokenPipe));
        }
    }
}
