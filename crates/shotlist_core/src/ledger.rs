use std::collections::BTreeMap;

use crate::{CaptureOutcome, CaptureStatus};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("duplicate outcome for sequence index {sequence_index}")]
    DuplicateSequence { sequence_index: usize },
    #[error("sequence index {sequence_index} is outside the run")]
    UnknownTarget { sequence_index: usize },
    #[error("run already finished; outcome for sequence index {sequence_index} refused")]
    RunFinished { sequence_index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutcomeCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl OutcomeCounts {
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }
}

/// Append-only record of outcomes for one run.
///
/// Keeps arrival order for live consumers and an index by `sequence_index`
/// for logical-order export. `append` is the only place that enforces
/// one outcome per target.
#[derive(Debug, Clone, Default)]
pub struct ResultLedger {
    total: usize,
    arrival: Vec<CaptureOutcome>,
    by_sequence: BTreeMap<usize, usize>,
}

impl ResultLedger {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            arrival: Vec::with_capacity(total),
            by_sequence: BTreeMap::new(),
        }
    }

    pub fn append(&mut self, outcome: CaptureOutcome) -> Result<(), LedgerError> {
        let sequence_index = outcome.sequence_index();
        if sequence_index >= self.total {
            return Err(LedgerError::UnknownTarget { sequence_index });
        }
        if self.by_sequence.contains_key(&sequence_index) {
            return Err(LedgerError::DuplicateSequence { sequence_index });
        }
        self.by_sequence.insert(sequence_index, self.arrival.len());
        self.arrival.push(outcome);
        Ok(())
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn len(&self) -> usize {
        self.arrival.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrival.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.arrival.len() == self.total
    }

    pub fn contains(&self, sequence_index: usize) -> bool {
        self.by_sequence.contains_key(&sequence_index)
    }

    pub fn get(&self, sequence_index: usize) -> Option<&CaptureOutcome> {
        self.by_sequence
            .get(&sequence_index)
            .map(|&pos| &self.arrival[pos])
    }

    pub fn arrival_order(&self) -> &[CaptureOutcome] {
        &self.arrival
    }

    pub fn logical_order(&self) -> Vec<&CaptureOutcome> {
        self.by_sequence
            .values()
            .map(|&pos| &self.arrival[pos])
            .collect()
    }

    /// Case-insensitive substring match on the target's host.
    pub fn by_domain(&self, needle: &str) -> Vec<&CaptureOutcome> {
        let needle = needle.to_lowercase();
        self.logical_order()
            .into_iter()
            .filter(|outcome| {
                let haystack = outcome
                    .target
                    .host()
                    .unwrap_or_else(|| outcome.target.normalized_url.clone());
                haystack.to_lowercase().contains(&needle)
            })
            .collect()
    }

    pub fn by_status(&self, status: CaptureStatus) -> Vec<&CaptureOutcome> {
        self.logical_order()
            .into_iter()
            .filter(|outcome| outcome.status == status)
            .collect()
    }

    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        for outcome in &self.arrival {
            match outcome.status {
                CaptureStatus::Success => counts.succeeded += 1,
                CaptureStatus::Skipped => counts.skipped += 1,
                CaptureStatus::Failed | CaptureStatus::TimedOut => counts.failed += 1,
            }
        }
        counts
    }
}
