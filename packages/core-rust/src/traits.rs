use std::fmt;

use async_trait::async_trait;

use crate::settings::{DatabaseCardinality, DatabaseSettings};
use crate::types::{DatabaseHandle, TenantId};

/// Durable persistence for queued, inbox and outbox messages in one
/// physical database.
///
/// Used as `Arc<dyn MessageStore>`; shared read-only by every tenant mapped
/// onto the store's database.
pub trait MessageStore: Send + Sync + fmt::Debug {
    /// Display name, derived from the database identifier.
    fn name(&self) -> &str;

    /// Settings the store was constructed with.
    fn settings(&self) -> &DatabaseSettings;

    /// Administrative interface (schema migration).
    fn admin(&self) -> &dyn MessageStoreAdmin;
}

/// Schema administration for a [`MessageStore`].
#[async_trait]
pub trait MessageStoreAdmin: Send + Sync {
    /// Brings the store's schema in line with its `AutoCreate` policy.
    ///
    /// Safe to call again after a failure.
    async fn migrate(&self) -> anyhow::Result<()>;

    /// Number of migrations that completed successfully.
    fn completed_migrations(&self) -> u64;
}

/// The multi-tenant database layer the message stores are built on.
///
/// Maps tenants onto physical databases and enumerates known databases.
#[async_trait]
pub trait DatabaseSource: Send + Sync {
    /// How tenants map onto databases. Fixed for the source's lifetime.
    fn cardinality(&self) -> DatabaseCardinality;

    /// Finds the database holding `tenant`, creating it if the source
    /// provisions databases lazily.
    async fn resolve_or_create_database(&self, tenant: &TenantId)
        -> anyhow::Result<DatabaseHandle>;

    /// Every database the source currently knows about.
    async fn all_databases(&self) -> anyhow::Result<Vec<DatabaseHandle>>;
}
