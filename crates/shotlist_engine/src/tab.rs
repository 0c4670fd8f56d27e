//! Per-capture tab ownership.
//!
//! A capture future can be dropped at any await point when its timeout fires,
//! so closing the tab cannot rely on code after the capture.

use futures_util::future::BoxFuture;
use shotlist_logging::scan_warn;
use tokio::runtime::Handle;

pub(crate) type CloseTab<T> = fn(T) -> BoxFuture<'static, ()>;

/// Owns one open tab until [`TabGuard::close`] is awaited. Dropping a guard
/// that still holds its tab spawns the close on the runtime it was opened on.
pub(crate) struct TabGuard<T> {
    tab: Option<T>,
    close: CloseTab<T>,
    runtime: Option<Handle>,
}

impl<T> TabGuard<T> {
    pub(crate) fn new(tab: T, close: CloseTab<T>) -> Self {
        Self {
            tab: Some(tab),
            close,
            runtime: Handle::try_current().ok(),
        }
    }

    pub(crate) async fn close(mut self) {
        if let Some(tab) = self.tab.take() {
            (self.close)(tab).await;
        }
    }
}

impl<T> Drop for TabGuard<T> {
    fn drop(&mut self) {
        let Some(tab) = self.tab.take() else {
            return;
        };
        match &self.runtime {
            Some(runtime) => {
                runtime.spawn((self.close)(tab));
            }
            None => scan_warn!("Tab dropped outside a tokio runtime; left open"),
        }
    }
}
