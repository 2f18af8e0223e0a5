//! Schema migration backend trait.
//!
//! Defines [`SchemaMigrator`], the abstraction a
//! [`DatabaseMessageStore`](super::DatabaseMessageStore) delegates its
//! administrative `migrate()` to. The store decides *when* to migrate; the
//! migrator decides *how* for a particular storage engine.

use async_trait::async_trait;
use postbox_core::DatabaseSettings;

/// Storage-engine specific schema provisioning.
///
/// Implementations must honor `settings.auto_create` and be safe to re-run
/// after a partial failure.
///
/// Used as `Arc<dyn SchemaMigrator>`.
#[async_trait]
pub trait SchemaMigrator: Send + Sync {
    /// Provisions the schema objects described by `settings` for the store
    /// named `store_name`.
    async fn migrate(&self, store_name: &str, settings: &DatabaseSettings) -> anyhow::Result<()>;
}
