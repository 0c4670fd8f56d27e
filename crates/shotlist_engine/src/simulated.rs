//! Deterministic in-process backend for tests and dry runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;

use crate::backend::{CaptureBackend, CaptureError, FailureKind};
use crate::tab::TabGuard;

/// Minimal JPEG: SOI, APP0 marker stub, EOI.
const FAKE_JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0xFF, 0xD9,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulatedBehavior {
    Succeed,
    /// Fail every attempt with the given kind.
    Fail(FailureKind),
    /// Fail the first `times` attempts, then succeed.
    FailTimes { kind: FailureKind, times: usize },
    /// Never answer; the adapter's timeout has to fire.
    Hang,
    /// Return zero bytes.
    Empty,
}

/// Answers after a fixed latency according to per-URL scripted behaviors.
///
/// URLs are matched against the normalized form handed to the backend.
pub struct SimulatedBackend {
    latency: Duration,
    default_behavior: SimulatedBehavior,
    script: HashMap<String, SimulatedBehavior>,
    calls: Mutex<HashMap<String, usize>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    open_tabs: Arc<AtomicUsize>,
}

impl SimulatedBackend {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            default_behavior: SimulatedBehavior::Succeed,
            script: HashMap::new(),
            calls: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            open_tabs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_behavior(mut self, url: impl Into<String>, behavior: SimulatedBehavior) -> Self {
        self.script.insert(url.into(), behavior);
        self
    }

    pub fn with_default_behavior(mut self, behavior: SimulatedBehavior) -> Self {
        self.default_behavior = behavior;
        self
    }

    /// Number of `open_page` calls seen for `url`.
    pub fn calls(&self, url: &str) -> usize {
        self.lock_calls().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.lock_calls().values().sum()
    }

    /// Highest number of simultaneous `open_page` calls observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Tabs opened and not yet closed, including ones whose capture was cut off.
    pub fn open_tabs(&self) -> usize {
        self.open_tabs.load(Ordering::SeqCst)
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, HashMap<String, usize>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn register_call(&self, url: &str) -> usize {
        let mut calls = self.lock_calls();
        let count = calls.entry(url.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl CaptureBackend for SimulatedBackend {
    async fn open_page(
        &self,
        url: &str,
        _quality: u8,
        _timeout: Duration,
    ) -> Result<Vec<u8>, CaptureError> {
        let attempt = self.register_call(url);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);
        self.open_tabs.fetch_add(1, Ordering::SeqCst);
        let tab = TabGuard::new(Arc::clone(&self.open_tabs), close_tab);

        let behavior = self.script.get(url).unwrap_or(&self.default_behavior);
        if *behavior == SimulatedBehavior::Hang {
            std::future::pending::<()>().await;
        }
        tokio::time::sleep(self.latency).await;

        let result = match behavior {
            SimulatedBehavior::Succeed | SimulatedBehavior::Hang => Ok(FAKE_JPEG.to_vec()),
            SimulatedBehavior::Empty => Ok(Vec::new()),
            SimulatedBehavior::Fail(kind) => Err(simulated_error(*kind, url)),
            SimulatedBehavior::FailTimes { kind, times } => {
                if attempt <= *times {
                    Err(simulated_error(*kind, url))
                } else {
                    Ok(FAKE_JPEG.to_vec())
                }
            }
        };
        tab.close().await;
        result
    }
}

fn close_tab(open_tabs: Arc<AtomicUsize>) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        open_tabs.fetch_sub(1, Ordering::SeqCst);
    })
}

fn simulated_error(kind: FailureKind, url: &str) -> CaptureError {
    CaptureError::new(kind, format!("simulated failure for {url}"))
}
