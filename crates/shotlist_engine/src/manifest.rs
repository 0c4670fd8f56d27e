use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use sha2::{Digest, Sha256};
use shotlist_core::{CaptureOutcome, CaptureStatus, ScanRun};

use crate::persist::{AtomicFileWriter, PersistError};

pub const MANIFEST_FILENAME: &str = "manifest.json";
pub const URL_MAPPING_FILENAME: &str = "url_mapping.json";
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Write the durable ledger of `run` (logical order) into its output directory.
pub fn write_run_manifest(run: &ScanRun) -> Result<PathBuf, PersistError> {
    let counts = run.counts();
    let outcomes: Vec<_> = run
        .logical_outcomes()
        .into_iter()
        .map(outcome_entry)
        .collect();

    let manifest = json!({
        "run_id": run.run_id.to_string(),
        "started_at": run.started_at.to_rfc3339(),
        "finished_at": run.finished_at.map(|t| t.to_rfc3339()),
        "cancelled": run.cancelled,
        "source": run.source,
        "config": {
            "concurrency": run.concurrency,
            "quality": run.quality,
            "timeout_ms": run.timeout_ms,
        },
        "total": run.total_targets,
        "succeeded": counts.succeeded,
        "failed": counts.failed,
        "skipped": counts.skipped,
        "outcomes": outcomes,
    });

    let content = serde_json::to_string_pretty(&manifest).map_err(std::io::Error::from)?;
    AtomicFileWriter::new(run.output_dir.clone()).write(MANIFEST_FILENAME, content)
}

fn outcome_entry(outcome: &CaptureOutcome) -> serde_json::Value {
    let filename = outcome
        .output_path
        .as_deref()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned());
    let (bytes, sha256) = match outcome.output_path.as_deref().map(fs::read) {
        Some(Ok(data)) => (Some(data.len() as u64), Some(hex_digest(&data))),
        _ => (None, None),
    };
    json!({
        "sequence_index": outcome.target.sequence_index,
        "url": outcome.target.normalized_url,
        "raw_url": outcome.target.raw_url,
        "status": outcome.status,
        "filename": filename,
        "error_detail": outcome.error_detail,
        "duration_ms": outcome.duration_ms,
        "completed_at": outcome.completed_at.to_rfc3339(),
        "bytes": bytes,
        "sha256": sha256,
    })
}

fn hex_digest(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest.iter() {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

/// Image file name -> source URL, accumulated across runs in one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlMapping {
    entries: BTreeMap<String, String>,
}

impl UrlMapping {
    /// Missing or unreadable mapping files yield an empty mapping.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(URL_MAPPING_FILENAME);
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        Self { entries }
    }

    pub fn merge_run(&mut self, run: &ScanRun) {
        for outcome in run.outcomes() {
            if outcome.status != CaptureStatus::Success {
                continue;
            }
            let name = outcome
                .output_path
                .as_deref()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned());
            if let Some(name) = name {
                self.entries
                    .insert(name, outcome.target.normalized_url.clone());
            }
        }
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn save(&self, dir: &Path) -> Result<PathBuf, PersistError> {
        let content = serde_json::to_string_pretty(&self.entries).map_err(std::io::Error::from)?;
        AtomicFileWriter::new(dir.to_path_buf()).write(URL_MAPPING_FILENAME, content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFile {
    pub filename: String,
    pub path: PathBuf,
    pub size: u64,
    pub url: Option<String>,
}

/// Every image in `dir`, sorted by file name, with its source URL when known.
pub fn list_captures(dir: &Path) -> Result<Vec<CaptureFile>, PersistError> {
    if !dir.is_dir() {
        return Err(PersistError::output_dir(dir, "does not exist"));
    }
    let mapping = UrlMapping::load(dir);
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)));
        if !is_image {
            continue;
        }
        let filename = entry.file_name().to_string_lossy().into_owned();
        files.push(CaptureFile {
            url: mapping.get(&filename).map(ToOwned::to_owned),
            size: entry.metadata()?.len(),
            filename,
            path,
        });
    }
    files.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(files)
}
