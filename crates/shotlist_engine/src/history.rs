//! Cross-run archive of scan summaries.
//!
//! The whole file is rewritten through [`AtomicFileWriter`] on every record,
//! so a crash leaves either the previous list or the new one. The store does
//! not lock the file: callers must not record two scans into one store at
//! the same time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shotlist_core::{HistoryEntry, HistoryStats, ScanRun};
use shotlist_logging::scan_info;
use thiserror::Error;

use crate::persist::{AtomicFileWriter, PersistError};

pub const DEFAULT_HISTORY_FILENAME: &str = "scan_history.ron";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("scan run {0} is not finished")]
    Unfinished(uuid::Uuid),
    #[error("history io error: {0}")]
    Io(#[from] io::Error),
    #[error("history write failed: {0}")]
    Persist(#[from] PersistError),
    #[error("history serialization failed: {0}")]
    Serialize(String),
    #[error("history file {path:?} is corrupt: {message}")]
    Corrupt { path: PathBuf, message: String },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedHistory {
    /// Oldest first.
    entries: Vec<HistoryEntry>,
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    max_entries: Option<usize>,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_entries: None,
        }
    }

    /// Keep only the `max` newest entries on each write.
    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a summary of `run`. Each call produces a new entry.
    pub fn record(&self, run: &ScanRun) -> Result<HistoryEntry, HistoryError> {
        let entry = HistoryEntry::from_run(run).ok_or(HistoryError::Unfinished(run.run_id))?;
        let mut history = self.load()?;
        history.entries.push(entry.clone());
        if let Some(max) = self.max_entries {
            let excess = history.entries.len().saturating_sub(max);
            history.entries.drain(..excess);
        }
        self.save(&history)?;
        scan_info!(
            "Recorded scan {} in history ({} entries)",
            entry.run_id,
            history.entries.len()
        );
        Ok(entry)
    }

    /// Most recent entries first.
    pub fn list(&self, limit: usize) -> Result<Vec<HistoryEntry>, HistoryError> {
        let history = self.load()?;
        Ok(history.entries.into_iter().rev().take(limit).collect())
    }

    pub fn stats(&self) -> Result<HistoryStats, HistoryError> {
        let history = self.load()?;
        Ok(HistoryStats::from_entries(&history.entries))
    }

    fn load(&self) -> Result<PersistedHistory, HistoryError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(PersistedHistory::default());
            }
            Err(err) => return Err(err.into()),
        };
        ron::from_str(&content).map_err(|err| HistoryError::Corrupt {
            path: self.path.clone(),
            message: err.to_string(),
        })
    }

    fn save(&self, history: &PersistedHistory) -> Result<(), HistoryError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(history, pretty)
            .map_err(|err| HistoryError::Serialize(err.to_string()))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let filename = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_HISTORY_FILENAME.to_string());
        AtomicFileWriter::new(dir).write(&filename, content)?;
        Ok(())
    }
}
