//! Shotlist engine: capture backends, the worker pool and run persistence.
mod backend;
mod chromium;
mod engine;
mod events;
mod filename;
mod history;
mod manifest;
mod persist;
mod scheduler;
mod simulated;
mod tab;

pub use backend::{CaptureAdapter, CaptureBackend, CaptureError, FailureKind};
pub use chromium::{CapturePolicy, ChromiumBackend, BLOCKED_MEDIA_PATTERNS};
pub use engine::EngineHandle;
pub use events::{ChannelProgressSink, NullSink, ProgressSink, ScanEvent};
pub use filename::{capture_filename, IMAGE_EXTENSION};
pub use history::{HistoryError, HistoryStore, DEFAULT_HISTORY_FILENAME};
pub use manifest::{
    list_captures, write_run_manifest, CaptureFile, UrlMapping, MANIFEST_FILENAME,
    URL_MAPPING_FILENAME,
};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use scheduler::{ScanError, Scheduler, RETRY_BUDGET};
pub use simulated::{SimulatedBackend, SimulatedBehavior};
pub use tokio_util::sync::CancellationToken;
