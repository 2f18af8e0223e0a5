//! Deferred configuration actions applied to every tenant message store.
//!
//! [`ConfigurationRegistry`] is append-only. Each store keeps a cursor into
//! it (see [`StoreSlot`](super::slot::StoreSlot)), so an action is applied to
//! a store exactly once and in registration order, whether the store existed
//! before the action was registered or was created afterwards.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use postbox_core::MessageStore;

/// A unit of setup work applied to every message store.
///
/// Used as `Arc<dyn StoreConfiguration>`.
#[async_trait]
pub trait StoreConfiguration: Send + Sync {
    /// Applies this configuration to `store`.
    async fn configure(&self, store: &Arc<dyn MessageStore>) -> anyhow::Result<()>;
}

/// Adapts an async closure into a [`StoreConfiguration`].
pub struct FnConfiguration<F>(F);

/// Wraps `f` as a shareable [`StoreConfiguration`].
pub fn configure_with<F, Fut>(f: F) -> Arc<dyn StoreConfiguration>
where
    F: Fn(Arc<dyn MessageStore>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(FnConfiguration(f))
}

#[async_trait]
impl<F, Fut> StoreConfiguration for FnConfiguration<F>
where
    F: Fn(Arc<dyn MessageStore>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn configure(&self, store: &Arc<dyn MessageStore>) -> anyhow::Result<()> {
        (self.0)(Arc::clone(store)).await
    }
}

/// Ordered, append-only list of configuration actions.
#[derive(Default)]
pub struct ConfigurationRegistry {
    actions: RwLock<Vec<Arc<dyn StoreConfiguration>>>,
}

impl ConfigurationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `action` and returns its position.
    pub fn push(&self, action: Arc<dyn StoreConfiguration>) -> usize {
        let mut actions = self.actions.write();
        actions.push(action);
        actions.len() - 1
    }

    /// Actions registered at or after position `from`, in order.
    #[must_use]
    pub fn pending_from(&self, from: usize) -> Vec<Arc<dyn StoreConfiguration>> {
        self.actions
            .read()
            .get(from..)
            .map(<[_]>::to_vec)
            .unwrap_or_default()
    }

    /// Number of registered actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.read().len()
    }

    /// Whether no action is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.read().is_empty()
    }
}
