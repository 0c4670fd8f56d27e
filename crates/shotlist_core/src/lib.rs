//! Shotlist core: pure capture domain (targets, outcomes, ledger, progress, history).
mod config;
mod history;
mod ledger;
mod outcome;
mod progress;
mod run;
mod target;

pub use config::{
    ConfigError, ScanConfig, DEFAULT_CONCURRENCY, DEFAULT_OUTPUT_DIR, DEFAULT_QUALITY,
    DEFAULT_TIMEOUT,
};
pub use history::{HistoryEntry, HistoryStats};
pub use ledger::{LedgerError, OutcomeCounts, ResultLedger};
pub use outcome::{CaptureOutcome, CaptureStatus};
pub use progress::{ProgressSnapshot, ProgressTracker};
pub use run::ScanRun;
pub use target::{
    dedupe_key, normalize_url, parse_targets, CaptureTarget, InvalidInputError, RejectedLine,
    TargetList,
};
