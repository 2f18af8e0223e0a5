use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use postbox_core::MessageStore;

use super::config::RuntimeOptions;
use crate::storage::StoreError;

// ---------------------------------------------------------------------------
// MessagingRuntime
// ---------------------------------------------------------------------------

/// The runtime's registry of message stores that take part in the send and
/// receive pipelines.
///
/// Stores are addressed by [`MessageStore::name`] and remembered in
/// registration order so pipelines can walk them deterministically.
pub struct MessagingRuntime {
    options: Arc<RuntimeOptions>,
    /// Name-based lookup: store name -> store.
    by_name: DashMap<String, Arc<dyn MessageStore>>,
    /// Registration order for deterministic iteration.
    order: RwLock<Vec<String>>,
}

impl MessagingRuntime {
    /// Creates a runtime with no registered stores.
    #[must_use]
    pub fn new(options: RuntimeOptions) -> Self {
        Self {
            options: Arc::new(options),
            by_name: DashMap::new(),
            order: RwLock::new(Vec::new()),
        }
    }

    /// Runtime-level options.
    #[must_use]
    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Registers a store with the runtime.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyRegistered`] if a store with the same
    /// name is already registered.
    pub fn register_store(&self, store: Arc<dyn MessageStore>) -> Result<(), StoreError> {
        let name = store.name().to_string();
        match self.by_name.entry(name.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyRegistered { name }),
            Entry::Vacant(slot) => {
                slot.insert(store);
                self.order.write().push(name);
                Ok(())
            }
        }
    }

    /// Removes a store from the runtime, returning it if it was registered.
    pub fn deregister_store(&self, name: &str) -> Option<Arc<dyn MessageStore>> {
        let removed = self.by_name.remove(name).map(|(_, store)| store);
        if removed.is_some() {
            self.order.write().retain(|registered| registered != name);
        }
        removed
    }

    /// Retrieves a registered store by name.
    #[must_use]
    pub fn store(&self, name: &str) -> Option<Arc<dyn MessageStore>> {
        self.by_name.get(name).map(|entry| entry.value().clone())
    }

    /// All registered stores in registration order.
    #[must_use]
    pub fn stores(&self) -> Vec<Arc<dyn MessageStore>> {
        let order = self.order.read().clone();
        order.iter().filter_map(|name| self.store(name)).collect()
    }

    /// Number of registered stores.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether no store is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl Default for MessagingRuntime {
    fn default() -> Self {
        Self::new(RuntimeOptions::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
