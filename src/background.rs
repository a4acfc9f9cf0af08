//! Registry for supervised background tasks.
//!
//! Turn supervisors and parked engine invocations register here so that
//! graceful shutdown can wait for every engine call to actually return
//! before the process exits.

// std::sync::Mutex is fine here: the lock is never held across an await.
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Tracked set of spawned tasks, awaited on shutdown.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl BackgroundTasks {
    #[must_use]
    pub fn new() -> Self {
        Self { handles: Arc::new(Mutex::new(Vec::new())) }
    }

    /// Spawn a task and register its handle. Registration happens before
    /// this returns, so even an instantly-finishing task is tracked.
    pub fn spawn<F>(&self, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        let mut guard = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        guard.retain(|h| !h.is_finished());
        guard.push(handle);
    }

    /// Wait for every registered task. Tasks spawned while draining (a
    /// timed-out turn parking its engine call) are picked up by looping
    /// until the registry stays empty.
    pub async fn shutdown(&self) {
        loop {
            let handles: Vec<_> = {
                let mut guard = self.handles.lock().unwrap_or_else(|e| e.into_inner());
                std::mem::take(&mut *guard)
            };
            if handles.is_empty() {
                return;
            }
            info!(count = handles.len(), "Waiting for in-flight background tasks");
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Background task panicked");
                }
            }
        }
    }

    /// Number of tasks still running.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        let mut guard = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        guard.retain(|h| !h.is_finished());
        guard.len()
    }
}
