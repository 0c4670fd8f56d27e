use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use shotlist_core::CaptureTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The attempt exceeded its time ceiling.
    Timeout,
    /// DNS, connection or navigation failure.
    Navigation,
    /// The page loaded but the image could not be produced.
    Render,
}

impl FailureKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, FailureKind::Timeout | FailureKind::Navigation)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Navigation => write!(f, "navigation error"),
            FailureKind::Render => write!(f, "render error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CaptureError {
    pub kind: FailureKind,
    pub message: String,
}

impl CaptureError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("no image within {} ms", limit.as_millis()),
        )
    }

    pub fn navigation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Navigation, message)
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Render, message)
    }
}

/// The opaque browser capability: load `url` and return encoded image bytes.
///
/// Implementations make exactly one attempt per call.
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    async fn open_page(
        &self,
        url: &str,
        quality: u8,
        timeout: Duration,
    ) -> Result<Vec<u8>, CaptureError>;

    /// Release browser resources once a run is over.
    async fn shutdown(&self) {}
}

/// Wraps a backend with the hard per-call time ceiling.
#[derive(Clone)]
pub struct CaptureAdapter {
    backend: Arc<dyn CaptureBackend>,
}

impl CaptureAdapter {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self { backend }
    }

    pub async fn capture(
        &self,
        target: &CaptureTarget,
        quality: u8,
        timeout: Duration,
    ) -> Result<Vec<u8>, CaptureError> {
        let call = self
            .backend
            .open_page(&target.normalized_url, quality, timeout);
        match tokio::time::timeout(timeout, call).await {
            Err(_) => Err(CaptureError::timeout(timeout)),
            Ok(Err(err)) => Err(err),
            Ok(Ok(bytes)) if bytes.is_empty() => Err(CaptureError::render("empty image")),
            Ok(Ok(bytes)) => Ok(bytes),
        }
    }

    pub async fn shutdown(&self) {
        self.backend.shutdown().await;
    }
}
