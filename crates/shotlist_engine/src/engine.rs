use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use shotlist_core::{ScanConfig, ScanRun, TargetList};
use tokio_util::sync::CancellationToken;

use crate::backend::CaptureBackend;
use crate::events::{ChannelProgressSink, ScanEvent};
use crate::scheduler::{ScanError, Scheduler};

/// A scan running on its own thread and tokio runtime, for synchronous callers
/// such as a terminal loop or a GUI event loop.
pub struct EngineHandle {
    event_rx: mpsc::Receiver<ScanEvent>,
    cancel: CancellationToken,
    worker: thread::JoinHandle<Result<ScanRun, ScanError>>,
}

impl EngineHandle {
    pub fn start(
        list: TargetList,
        config: ScanConfig,
        backend: Arc<dyn CaptureBackend>,
    ) -> Result<Self, ScanError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("shotlist-capture")
            .build()
            .map_err(|err| ScanError::Engine(format!("tokio runtime: {err}")))?;
        let (event_tx, event_rx) = mpsc::channel();
        let cancel = CancellationToken::new();
        let run_cancel = cancel.clone();

        let worker = thread::Builder::new()
            .name("shotlist-engine".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let scheduler = Scheduler::new(backend);
                    let sink = Arc::new(ChannelProgressSink::new(event_tx));
                    let result = scheduler.run(list, &config, sink, run_cancel).await;
                    scheduler.shutdown().await;
                    result
                })
            })
            .map_err(|err| ScanError::Engine(format!("engine thread: {err}")))?;

        Ok(Self {
            event_rx,
            cancel,
            worker,
        })
    }

    pub fn try_recv(&self) -> Option<ScanEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<ScanEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Stop dispatching new targets; in-flight captures finish on their own.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Wait for the run to terminate and return it.
    pub fn join(self) -> Result<ScanRun, ScanError> {
        self.worker
            .join()
            .map_err(|_| ScanError::Engine("engine thread panicked".to_string()))?
    }
}
