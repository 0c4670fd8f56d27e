use std::path::PathBuf;

use pretty_assertions::assert_eq;
use shotlist_core::{
    parse_targets, CaptureOutcome, CaptureStatus, HistoryEntry, HistoryStats, ScanConfig, ScanRun,
};

#[test]
fn history_entry_requires_finished_run_and_gets_fresh_id() {
    let targets = parse_targets("a.com\nb.com\nc.com\n").unwrap().targets;
    let mut run = ScanRun::start(&ScanConfig::default(), targets.len());
    run.record(CaptureOutcome::success(targets[0].clone(), PathBuf::from("a.jpg"), 3))
        .unwrap();
    run.record(CaptureOutcome::unsuccessful(
        targets[1].clone(),
        CaptureStatus::TimedOut,
        "scan deadline elapsed",
        0,
    ))
    .unwrap();
    run.record(CaptureOutcome::unsuccessful(
        targets[2].clone(),
        CaptureStatus::Skipped,
        "cancelled",
        0,
    ))
    .unwrap();
    assert!(HistoryEntry::from_run(&run).is_none());

    run.finish(true);
    let first = HistoryEntry::from_run(&run).unwrap();
    let second = HistoryEntry::from_run(&run).unwrap();

    assert_ne!(first.entry_id, second.entry_id);
    assert_eq!(first.run_id, run.run_id);
    assert_eq!(first.total, 3);
    assert_eq!(first.succeeded, 1);
    assert_eq!(first.failed, 1);
    assert_eq!(first.skipped, 1);
    assert!(first.cancelled);

    let stats = HistoryStats::from_entries(&[first, second]);
    assert_eq!(stats.total_runs, 2);
    assert_eq!(stats.total_targets, 6);
    assert_eq!(stats.total_captured, 2);
    assert!((stats.success_rate - 1.0 / 3.0).abs() < 1e-9);
}

#[test]
fn stats_of_no_entries_are_zero() {
    let stats = HistoryStats::from_entries(&[]);
    assert_eq!(stats.total_runs, 0);
    assert_eq!(stats.total_targets, 0);
    assert_eq!(stats.success_rate, 0.0);
}
