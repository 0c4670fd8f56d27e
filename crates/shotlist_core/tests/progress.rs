use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use shotlist_core::{
    parse_targets, CaptureOutcome, CaptureStatus, ProgressSnapshot, ProgressTracker,
};

fn init_logging() {
    shotlist_logging::initialize_for_tests();
}

#[test]
fn concurrent_delivery_neither_under_nor_overcounts() {
    init_logging();
    let input: String = (0..200).map(|i| format!("host{i}.example.com\n")).collect();
    let targets = parse_targets(&input).unwrap().targets;
    let tracker = Arc::new(ProgressTracker::new(targets.len()));

    let handles: Vec<_> = targets
        .chunks(25)
        .map(|chunk| {
            let tracker = Arc::clone(&tracker);
            let chunk = chunk.to_vec();
            thread::spawn(move || {
                let mut last_completed = 0;
                for target in chunk {
                    let outcome = if target.sequence_index % 4 == 0 {
                        CaptureOutcome::unsuccessful(target, CaptureStatus::Failed, "timeout", 1)
                    } else {
                        CaptureOutcome::success(target, PathBuf::from("x.jpg"), 1)
                    };
                    let snapshot = tracker.on_outcome(&outcome);
                    assert!(snapshot.completed > last_completed);
                    last_completed = snapshot.completed;
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(
        tracker.snapshot(),
        ProgressSnapshot {
            completed: 200,
            total: 200,
            succeeded: 150,
            failed: 50,
            skipped: 0,
        }
    );
    assert!(tracker.snapshot().is_done());
}

#[test]
fn snapshot_fraction_handles_zero_total() {
    let tracker = ProgressTracker::new(0);
    assert_eq!(tracker.snapshot().fraction(), 0.0);
}
