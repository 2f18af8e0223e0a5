//! One-time wiring and provisioning of freshly built message stores.
//!
//! [`StoreInitializer`] separates the two side effects a new store needs:
//! [`register`](StoreInitializer::register) wires it into the
//! [`MessagingRuntime`] (in-memory, safe inside a critical section) and
//! [`provision`](StoreInitializer::provision) migrates its schema (I/O, must
//! run outside any lock).

use std::sync::Arc;

use postbox_core::{AutoCreate, MessageStore};
use tracing::{info, warn};

use super::error::StoreError;
use crate::runtime::MessagingRuntime;

/// Runs the runtime registration and schema provisioning steps for stores.
#[derive(Clone)]
pub struct StoreInitializer {
    runtime: Arc<MessagingRuntime>,
}

impl StoreInitializer {
    /// Creates an initializer wiring stores into `runtime`.
    #[must_use]
    pub fn new(runtime: Arc<MessagingRuntime>) -> Self {
        Self { runtime }
    }

    /// The runtime stores are registered with.
    #[must_use]
    pub fn runtime(&self) -> &Arc<MessagingRuntime> {
        &self.runtime
    }

    /// Registers `store` with the runtime so pipelines can use it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyRegistered`] if a store with the same
    /// name was registered before.
    pub fn register(&self, store: &Arc<dyn MessageStore>) -> Result<(), StoreError> {
        self.runtime.register_store(Arc::clone(store))
    }

    /// Removes `store` from the runtime. Used when a store is unpublished
    /// after a failed provisioning.
    pub fn unregister(&self, store: &Arc<dyn MessageStore>) {
        self.runtime.deregister_store(store.name());
    }

    /// Migrates `store` unless `policy` is [`AutoCreate::None`].
    ///
    /// Returns whether a migration ran.
    ///
    /// # Errors
    ///
    /// Propagates the migration failure unchanged.
    pub async fn provision(
        &self,
        store: &Arc<dyn MessageStore>,
        policy: AutoCreate,
    ) -> anyhow::Result<bool> {
        if !policy.is_enabled() {
            return Ok(false);
        }

        match store.admin().migrate().await {
            Ok(()) => {
                metrics::counter!("postbox_store_migrations_total").increment(1);
                info!(store = store.name(), ?policy, "message store migrated");
                Ok(true)
            }
            Err(err) => {
                metrics::counter!("postbox_store_migration_failures_total").increment(1);
                warn!(
                    store = store.name(),
                    ?policy,
                    error = %err,
                    "message store migration failed"
                );
                Err(err)
            }
        }
    }
}
