use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::{CaptureOutcome, CaptureStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ProgressSnapshot {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

/// Shared progress counter. Safe to call from any worker; all counts are
/// updated under one lock so a snapshot never mixes two deliveries.
#[derive(Debug)]
pub struct ProgressTracker {
    inner: Mutex<ProgressSnapshot>,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            inner: Mutex::new(ProgressSnapshot {
                total,
                ..ProgressSnapshot::default()
            }),
        }
    }

    pub fn on_outcome(&self, outcome: &CaptureOutcome) -> ProgressSnapshot {
        let mut snapshot = self.lock();
        snapshot.completed += 1;
        match outcome.status {
            CaptureStatus::Success => snapshot.succeeded += 1,
            CaptureStatus::Skipped => snapshot.skipped += 1,
            CaptureStatus::Failed | CaptureStatus::TimedOut => snapshot.failed += 1,
        }
        *snapshot
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, ProgressSnapshot> {
        // Counters stay valid even if a holder panicked mid-update.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
