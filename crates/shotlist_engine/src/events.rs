use std::sync::mpsc;

use shotlist_core::{CaptureOutcome, OutcomeCounts, ProgressSnapshot};
use uuid::Uuid;

/// Live stream of a scan, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    Started {
        run_id: Uuid,
        total: usize,
    },
    Outcome(CaptureOutcome),
    Progress(ProgressSnapshot),
    Finished {
        run_id: Uuid,
        counts: OutcomeCounts,
        cancelled: bool,
    },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ScanEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ScanEvent) {}
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<ScanEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<ScanEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: ScanEvent) {
        // A consumer that hung up does not stop the scan.
        let _ = self.tx.send(event);
    }
}
