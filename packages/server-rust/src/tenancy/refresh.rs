//! Background driver for [`TenantStoreCache::refresh`].
//!
//! [`RefreshWorker`] spawns a tokio task that sweeps once at startup, then on
//! every tick of the configured interval, and on demand via
//! [`refresh_now`](RefreshWorker::refresh_now). Failed sweeps are logged and
//! retried on the next tick only.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::cache::TenantStoreCache;
use super::error::TenancyError;

/// On-demand sweep request; the reply carries the sweep outcome.
struct RefreshRequest {
    reply: oneshot::Sender<Result<(), TenancyError>>,
}

/// Periodic refresh task for one cache.
pub struct RefreshWorker {
    tx: Option<mpsc::Sender<RefreshRequest>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl RefreshWorker {
    /// Starts sweeping `cache` every `interval`.
    ///
    /// The first sweep runs immediately. Must be called inside a tokio runtime.
    #[must_use]
    pub fn start(cache: Arc<TenantStoreCache>, interval: Duration) -> Self {
        let (tx, mut rx) = mpsc::channel::<RefreshRequest>(16);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    request = rx.recv() => {
                        match request {
                            Some(request) => {
                                let result = cache.refresh().await;
                                let _ = request.reply.send(result);
                            }
                            None => break,
                        }
                    }
                    _ = ticker.tick() => {
                        if let Err(err) = cache.refresh().await {
                            warn!(error = %err, "scheduled message store refresh failed");
                        }
                    }
                    _ = &mut shutdown_rx => {
                        break;
                    }
                }
            }

            debug!("refresh worker stopped");
        });

        Self {
            tx: Some(tx),
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    /// Starts sweeping `cache` at the runtime's configured refresh interval.
    #[must_use]
    pub fn for_cache(cache: Arc<TenantStoreCache>) -> Self {
        let interval = cache.runtime().options().refresh_interval;
        Self::start(cache, interval)
    }

    /// Runs a sweep now and waits for its outcome.
    ///
    /// # Errors
    ///
    /// Returns the sweep's [`TenancyError`], or an error if the worker has
    /// been stopped.
    pub async fn refresh_now(&self) -> anyhow::Result<()> {
        let Some(tx) = &self.tx else {
            anyhow::bail!("refresh worker not running");
        };
        let (reply, response) = oneshot::channel();
        tx.send(RefreshRequest { reply })
            .await
            .map_err(|_| anyhow::anyhow!("refresh worker channel closed"))?;
        response
            .await
            .map_err(|_| anyhow::anyhow!("refresh worker dropped the request"))??;
        Ok(())
    }

    /// Stops the worker, waiting for an in-flight sweep to finish.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}
