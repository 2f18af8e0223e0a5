//! A published message store plus its provisioning state.

use std::sync::Arc;

use postbox_core::{DatabaseId, MessageStore};
use tokio::sync::{watch, Mutex as AsyncMutex};

use super::configuration::ConfigurationRegistry;
use super::error::TenancyError;

/// Provisioning state of a published store.
///
/// State machine: Provisioning -> Ready | Failed | Unpublished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Configuration actions or migration still running.
    Provisioning,
    /// Fully configured and migrated.
    Ready,
    /// Provisioning failed; the store stays published.
    Failed(String),
    /// Provisioning failed and the store was withdrawn from the cache.
    Unpublished(String),
}

/// Entry shared by the tenant and database lookup maps.
pub(crate) struct StoreSlot {
    database: DatabaseId,
    store: Arc<dyn MessageStore>,
    readiness: watch::Sender<Readiness>,
    /// Number of registry actions already applied to `store`.
    applied: AsyncMutex<usize>,
}

impl StoreSlot {
    pub(crate) fn new(database: DatabaseId, store: Arc<dyn MessageStore>) -> Self {
        let (readiness, _rx) = watch::channel(Readiness::Provisioning);
        Self {
            database,
            store,
            readiness,
            applied: AsyncMutex::new(0),
        }
    }

    pub(crate) fn database(&self) -> &DatabaseId {
        &self.database
    }

    pub(crate) fn store(&self) -> Arc<dyn MessageStore> {
        Arc::clone(&self.store)
    }

    pub(crate) fn readiness(&self) -> Readiness {
        self.readiness.borrow().clone()
    }

    pub(crate) fn mark(&self, state: Readiness) {
        self.readiness.send_replace(state);
    }

    /// Returns the store once provisioning has settled.
    ///
    /// A `Failed` store is still returned; only an unpublished one is an error.
    pub(crate) async fn ready_store(&self) -> Result<Arc<dyn MessageStore>, TenancyError> {
        let mut state = self.readiness();
        if state == Readiness::Provisioning {
            let mut rx = self.readiness.subscribe();
            state = match rx.wait_for(|s| *s != Readiness::Provisioning).await {
                Ok(settled) => settled.clone(),
                Err(_) => Readiness::Unpublished("readiness channel closed".to_string()),
            };
        }

        match state {
            Readiness::Ready | Readiness::Failed(_) | Readiness::Provisioning => Ok(self.store()),
            Readiness::Unpublished(reason) => Err(TenancyError::Unpublished {
                store: self.store.name().to_string(),
                reason,
            }),
        }
    }

    /// Applies every registry action this store has not seen yet, in order.
    ///
    /// Stops at the first failing action; it stays pending for the next pass.
    pub(crate) async fn apply_pending(
        &self,
        registry: &ConfigurationRegistry,
    ) -> Result<(), TenancyError> {
        let mut applied = self.applied.lock().await;
        loop {
            let pending = registry.pending_from(*applied);
            if pending.is_empty() {
                return Ok(());
            }
            for action in pending {
                action
                    .configure(&self.store)
                    .await
                    .map_err(|source| TenancyError::Configuration {
                        store: self.store.name().to_string(),
                        index: *applied,
                        source,
                    })?;
                *applied += 1;
            }
        }
    }
}
