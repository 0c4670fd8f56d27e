use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ScanRun;

/// Summary of one finished run. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub entry_id: Uuid,
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    #[serde(default)]
    pub skipped: usize,
    #[serde(default)]
    pub cancelled: bool,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub source: Option<String>,
}

impl HistoryEntry {
    /// Returns `None` while the run is still in progress.
    pub fn from_run(run: &ScanRun) -> Option<Self> {
        run.finished_at?;
        let counts = run.counts();
        Some(Self {
            entry_id: Uuid::new_v4(),
            run_id: run.run_id,
            timestamp: Utc::now(),
            total: run.total_targets,
            succeeded: counts.succeeded,
            failed: counts.failed,
            skipped: counts.skipped,
            cancelled: run.cancelled,
            output_dir: run.output_dir.clone(),
            source: run.source.clone(),
        })
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HistoryStats {
    pub total_runs: usize,
    pub total_targets: usize,
    pub total_captured: usize,
    pub total_failed: usize,
    /// captured / targets across all runs; 0.0 with no targets.
    pub success_rate: f64,
}

impl HistoryStats {
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        let mut stats = entries.iter().fold(Self::default(), |mut acc, entry| {
            acc.total_runs += 1;
            acc.total_targets += entry.total;
            acc.total_captured += entry.succeeded;
            acc.total_failed += entry.failed;
            acc
        });
        if stats.total_targets > 0 {
            stats.success_rate = stats.total_captured as f64 / stats.total_targets as f64;
        }
        stats
    }
}
