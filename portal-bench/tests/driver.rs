//! Full runs with spawned worker processes.
use std::path::PathBuf;

use portal_base::{Error, Pattern, RunConfig};
use portal_bench::{run, BenchOptions};

fn options() -> BenchOptions {
    BenchOptions {
        platform_tag: "test".to_string(),
        worker_binary: Some(PathBuf::from(env!("CARGO_BIN_EXE_portal-worker"))),
        ..BenchOptions::default()
    }
}

fn records(pattern: Pattern) -> Vec<String> {
    let config = RunConfig::new(3, 2, 120, pattern).unwrap();
    let mut out = vec![];
    run(config, &options(), &mut out).unwrap();
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn check(lines: &[String], pattern: &str) {
    assert_eq!(lines.len(), 2);
    for line in lines {
        let fields: Vec<&str> = line.split(';').collect();
        assert_eq!(fields.len(), 7);
        assert_eq!(&fields[..5], ["test", "portal", pattern, "120", "3"]);
        for seconds in &fields[5..] {
            let value: f64 = seconds.parse().unwrap();
            assert!(value >= 0.0);
            assert_eq!(seconds.split('.').nth(1).map(str::len), Some(6));
        }
    }
}

#[test]
fn test_gather_run() {
    check(&records(Pattern::Gather), "gather");
}

#[test]
fn test_broadcast_run() {
    check(&records(Pattern::Broadcast), "broadcast");
}

/// A worker that exits before connecting fails the run without output
#[cfg(unix)]
#[test]
fn test_worker_failure() {
    let options = BenchOptions {
        worker_binary: Some(PathBuf::from("/bin/false")),
        ..BenchOptions::default()
    };
    let config = RunConfig::new(2, 1, 8, Pattern::Gather).unwrap();
    let mut out = vec![];
    let result = run(config, &options, &mut out);
    assert!(matches!(result, Err(Error::WorkerFailed { .. })));
    assert!(out.is_empty());
}
