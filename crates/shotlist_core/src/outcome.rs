use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CaptureTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureStatus {
    Success,
    Failed,
    TimedOut,
    Skipped,
}

impl CaptureStatus {
    /// Counted as a failure in progress snapshots and summaries.
    pub fn is_failure(self) -> bool {
        matches!(self, CaptureStatus::Failed | CaptureStatus::TimedOut)
    }
}

impl fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureStatus::Success => write!(f, "success"),
            CaptureStatus::Failed => write!(f, "failed"),
            CaptureStatus::TimedOut => write!(f, "timed out"),
            CaptureStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Terminal result for one target. Created exactly once per target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureOutcome {
    pub target: CaptureTarget,
    pub status: CaptureStatus,
    pub output_path: Option<PathBuf>,
    pub error_detail: Option<String>,
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
}

impl CaptureOutcome {
    pub fn success(target: CaptureTarget, output_path: PathBuf, duration_ms: u64) -> Self {
        Self {
            target,
            status: CaptureStatus::Success,
            output_path: Some(output_path),
            error_detail: None,
            duration_ms,
            completed_at: Utc::now(),
        }
    }

    /// Any non-success outcome; `status` must not be `Success`.
    pub fn unsuccessful(
        target: CaptureTarget,
        status: CaptureStatus,
        detail: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        debug_assert!(status != CaptureStatus::Success);
        Self {
            target,
            status,
            output_path: None,
            error_detail: Some(detail.into()),
            duration_ms,
            completed_at: Utc::now(),
        }
    }

    pub fn sequence_index(&self) -> usize {
        self.target.sequence_index
    }
}
