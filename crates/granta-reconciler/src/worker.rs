//! Periodic reconciliation worker.
//!
//! Runs the engine on a fixed interval, each pass guarded end-to-end by
//! the cluster-wide lock. Losing the lock race means another instance is
//! already reconciling; the cycle is skipped with a debug log and the
//! scheduler simply waits for the next tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;
use tokio::time::interval;
use tracing::{debug, error, info};

use granta_core::{LockError, LockService};

use crate::config::WorkerConfig;
use crate::engine::Reconciler;

/// Name of the cluster-wide reconciliation lock.
pub const RECONCILIATION_LOCK: &str = "reconciliation-worker";

/// Worker that drives periodic reconciliation passes.
pub struct ReconciliationWorker {
    reconciler: Arc<Reconciler>,
    lock: Arc<dyn LockService>,
    config: WorkerConfig,
    shutdown: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
}

impl ReconciliationWorker {
    /// Create a new worker.
    pub fn new(
        reconciler: Arc<Reconciler>,
        lock: Arc<dyn LockService>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            reconciler,
            lock,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
        }
    }

    /// Start the worker loop.
    pub async fn run(&self) {
        info!(
            run_interval_secs = self.config.run_interval_secs,
            lock_ttl_secs = self.config.lock_ttl().as_secs(),
            "Starting reconciliation worker"
        );

        let mut tick = interval(self.config.run_interval());
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if self.shutdown.load(Ordering::Relaxed) {
                        info!("Worker shutdown requested, stopping loop");
                        break;
                    }
                    self.run_cycle().await;
                }
                () = self.shutdown_notify.notified() => {
                    info!("Worker shutdown requested, stopping loop");
                    break;
                }
            }
        }

        info!("Worker stopped");
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        info!("Shutdown requested");
        self.shutdown.store(true, Ordering::Relaxed);
        self.shutdown_notify.notify_waiters();
    }

    /// Check if shutdown was requested.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Run one lock-guarded reconciliation cycle.
    ///
    /// Pass failures are logged and absorbed here: the next cycle retries
    /// from a clean snapshot of provider state, which is safe because
    /// every corrective action is idempotent.
    pub async fn run_cycle(&self) {
        let handle = match self
            .lock
            .acquire(RECONCILIATION_LOCK, self.config.lock_ttl())
            .await
        {
            Ok(handle) => handle,
            Err(LockError::NotAcquired { .. }) => {
                debug!("Could not acquire global lock for entitlement reconciliation");
                return;
            }
            Err(e) => {
                error!(error = %e, "Lock acquisition failed");
                return;
            }
        };

        match self.reconciler.reconcile_all().await {
            Ok(summary) => {
                info!(
                    entitlements_created = summary.entitlements_created,
                    entitlements_removed = summary.entitlements_removed,
                    "Reconciliation cycle complete"
                );
            }
            Err(e) => {
                error!(error = %e, "Reconciliation pass aborted");
            }
        }

        if let Err(e) = self.lock.release(handle).await {
            error!(error = %e, "Failed to release reconciliation lock");
        }
    }
}
