use std::path::PathBuf;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{CaptureOutcome, LedgerError, OutcomeCounts, ResultLedger, ScanConfig};

/// One pass over a target list. Mutated only by recording outcomes and by
/// [`ScanRun::finish`]; read-only afterwards.
#[derive(Debug, Clone)]
pub struct ScanRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub total_targets: usize,
    pub concurrency: usize,
    pub quality: u8,
    pub timeout_ms: u64,
    pub output_dir: PathBuf,
    pub source: Option<String>,
    pub cancelled: bool,
    ledger: ResultLedger,
}

impl ScanRun {
    pub fn start(config: &ScanConfig, total_targets: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            total_targets,
            concurrency: config.concurrency,
            quality: config.quality,
            timeout_ms: config.timeout_ms(),
            output_dir: config.output_dir.clone(),
            source: config.source_label.clone(),
            cancelled: false,
            ledger: ResultLedger::new(total_targets),
        }
    }

    pub fn record(&mut self, outcome: CaptureOutcome) -> Result<(), LedgerError> {
        if self.is_finished() {
            return Err(LedgerError::RunFinished {
                sequence_index: outcome.sequence_index(),
            });
        }
        self.ledger.append(outcome)
    }

    pub fn finish(&mut self, cancelled: bool) {
        if self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
            self.cancelled = cancelled;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Outcomes in the order they completed.
    pub fn outcomes(&self) -> &[CaptureOutcome] {
        self.ledger.arrival_order()
    }

    /// Outcomes sorted by `sequence_index`, for export.
    pub fn logical_outcomes(&self) -> Vec<&CaptureOutcome> {
        self.ledger.logical_order()
    }

    pub fn ledger(&self) -> &ResultLedger {
        &self.ledger
    }

    pub fn counts(&self) -> OutcomeCounts {
        self.ledger.counts()
    }
}
