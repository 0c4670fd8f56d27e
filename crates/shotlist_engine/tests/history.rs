use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use shotlist_core::{parse_targets, CaptureOutcome, CaptureStatus, ScanConfig, ScanRun};
use shotlist_engine::{HistoryError, HistoryStore};
use tempfile::TempDir;

fn finished_run(output_dir: &str, succeeded: usize, failed: usize) -> ScanRun {
    let input: String = (0..succeeded + failed)
        .map(|i| format!("h{i}.example.com\n"))
        .collect();
    let targets = parse_targets(&input).unwrap().targets;
    let config = ScanConfig {
        source_label: Some("urls.txt".to_string()),
        ..ScanConfig::with_output(output_dir)
    };
    let mut run = ScanRun::start(&config, targets.len());
    for (i, target) in targets.into_iter().enumerate() {
        let outcome = if i < succeeded {
            CaptureOutcome::success(target, PathBuf::from(format!("{i}.jpg")), 1)
        } else {
            CaptureOutcome::unsuccessful(target, CaptureStatus::Failed, "navigation error", 1)
        };
        run.record(outcome).unwrap();
    }
    run.finish(false);
    run
}

#[test]
fn missing_file_reads_as_empty_history() {
    let temp = TempDir::new().unwrap();
    let store = HistoryStore::new(temp.path().join("history.ron"));

    assert!(store.list(10).unwrap().is_empty());
    let stats = store.stats().unwrap();
    assert_eq!(stats.total_runs, 0);
    assert_eq!(stats.success_rate, 0.0);
}

#[test]
fn recording_same_run_twice_appends_two_entries() {
    let temp = TempDir::new().unwrap();
    let store = HistoryStore::new(temp.path().join("history.ron"));
    let run = finished_run("out", 3, 1);

    let first = store.record(&run).unwrap();
    let second = store.record(&run).unwrap();

    assert_ne!(first.entry_id, second.entry_id);
    let listed = store.list(10).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].entry_id, second.entry_id);
    assert_eq!(listed[1].entry_id, first.entry_id);
    assert_eq!(listed[0].source.as_deref(), Some("urls.txt"));
}

#[test]
fn list_is_newest_first_and_limited() {
    let temp = TempDir::new().unwrap();
    let store = HistoryStore::new(temp.path().join("history.ron"));
    for dir in ["a", "b", "c"] {
        store.record(&finished_run(dir, 1, 0)).unwrap();
    }

    let dirs: Vec<_> = store
        .list(2)
        .unwrap()
        .into_iter()
        .map(|e| e.output_dir)
        .collect();
    assert_eq!(dirs, vec![PathBuf::from("c"), PathBuf::from("b")]);
}

#[test]
fn stats_aggregate_across_entries() {
    let temp = TempDir::new().unwrap();
    let store = HistoryStore::new(temp.path().join("history.ron"));
    store.record(&finished_run("a", 3, 1)).unwrap();
    store.record(&finished_run("b", 1, 3)).unwrap();

    let stats = store.stats().unwrap();
    assert_eq!(stats.total_runs, 2);
    assert_eq!(stats.total_targets, 8);
    assert_eq!(stats.total_captured, 4);
    assert_eq!(stats.total_failed, 4);
    assert!((stats.success_rate - 0.5).abs() < 1e-9);
}

#[test]
fn unfinished_run_is_not_recorded() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("history.ron");
    let store = HistoryStore::new(&path);
    let run = ScanRun::start(&ScanConfig::default(), 1);

    let err = store.record(&run).unwrap_err();
    assert!(matches!(err, HistoryError::Unfinished(id) if id == run.run_id));
    assert!(!path.exists());
}

#[test]
fn retention_keeps_newest_entries() {
    let temp = TempDir::new().unwrap();
    let store = HistoryStore::new(temp.path().join("history.ron")).with_max_entries(2);
    for dir in ["a", "b", "c", "d"] {
        store.record(&finished_run(dir, 1, 0)).unwrap();
    }

    let dirs: Vec<_> = store
        .list(10)
        .unwrap()
        .into_iter()
        .map(|e| e.output_dir)
        .collect();
    assert_eq!(dirs, vec![PathBuf::from("d"), PathBuf::from("c")]);
}

#[test]
fn corrupt_file_is_reported_and_left_untouched() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("history.ron");
    fs::write(&path, "(entries: [ (entry_id: ").unwrap();
    let store = HistoryStore::new(&path);

    assert!(matches!(store.list(5), Err(HistoryError::Corrupt { .. })));
    assert!(matches!(
        store.record(&finished_run("a", 1, 0)),
        Err(HistoryError::Corrupt { .. })
    ));
    assert_eq!(fs::read_to_string(&path).unwrap(), "(entries: [ (entry_id: ");
}

#[test]
fn entries_survive_reopening_the_store() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("history.ron");
    let recorded = HistoryStore::new(&path)
        .record(&finished_run("a", 2, 0))
        .unwrap();

    let reopened = HistoryStore::new(&path).list(1).unwrap();
    assert_eq!(reopened, vec![recorded]);
}
