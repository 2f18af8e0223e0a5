//! Fakes for exercising the tenant store cache.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use postbox_core::{DatabaseCardinality, DatabaseHandle, DatabaseSettings, DatabaseSource, TenantId};

use crate::storage::SchemaMigrator;

/// In-memory `DatabaseSource` with optional latency and injected failures.
///
/// Unassigned tenants get a database of their own (`db-<tenant>`), created
/// on first resolution, like a database-per-tenant document layer.
pub(crate) struct FakeDatabaseSource {
    assignments: Mutex<HashMap<TenantId, DatabaseHandle>>,
    databases: Mutex<Vec<DatabaseHandle>>,
    failing: Mutex<HashSet<TenantId>>,
    resolve_calls: AtomicUsize,
    delay: Duration,
}

impl FakeDatabaseSource {
    pub(crate) fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            assignments: Mutex::new(HashMap::new()),
            databases: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            resolve_calls: AtomicUsize::new(0),
            delay,
        }
    }

    fn handle(database: &str) -> DatabaseHandle {
        DatabaseHandle::new(database, format!("postgres://localhost/{database}"))
    }

    /// Assigns `tenant` to `database`, making the database enumerable.
    pub(crate) fn assign(&self, tenant: &str, database: &str) {
        let handle = Self::handle(database);
        self.add_handle(&handle);
        self.assignments.lock().insert(TenantId::from(tenant), handle);
    }

    /// Makes `database` enumerable without assigning any tenant.
    pub(crate) fn add_database(&self, database: &str) {
        self.add_handle(&Self::handle(database));
    }

    fn add_handle(&self, handle: &DatabaseHandle) {
        let mut databases = self.databases.lock();
        if !databases.iter().any(|known| known.identifier == handle.identifier) {
            databases.push(handle.clone());
        }
    }

    /// Makes resolution of `tenant` fail until [`heal`](Self::heal) is called.
    pub(crate) fn fail_tenant(&self, tenant: &str) {
        self.failing.lock().insert(TenantId::from(tenant));
    }

    pub(crate) fn heal(&self, tenant: &str) {
        self.failing.lock().remove(tenant);
    }

    pub(crate) fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseSource for FakeDatabaseSource {
    fn cardinality(&self) -> DatabaseCardinality {
        DatabaseCardinality::DynamicMultiple
    }

    async fn resolve_or_create_database(
        &self,
        tenant: &TenantId,
    ) -> anyhow::Result<DatabaseHandle> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.lock().contains(tenant) {
            anyhow::bail!("database server unreachable for {tenant}");
        }

        let assigned = self.assignments.lock().get(tenant).cloned();
        if let Some(handle) = assigned {
            return Ok(handle);
        }
        let database = format!("db-{tenant}");
        self.assign(tenant.as_str(), &database);
        Ok(Self::handle(&database))
    }

    async fn all_databases(&self) -> anyhow::Result<Vec<DatabaseHandle>> {
        Ok(self.databases.lock().clone())
    }
}

/// `SchemaMigrator` that counts migrations per store and can be made to fail.
pub(crate) struct CountingMigrator {
    runs: Mutex<HashMap<String, usize>>,
    failing: Mutex<HashSet<String>>,
    delay: Duration,
}

impl CountingMigrator {
    pub(crate) fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub(crate) fn with_delay(delay: Duration) -> Self {
        Self {
            runs: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            delay,
        }
    }

    /// Makes migrations of `store` fail until [`heal`](Self::heal) is called.
    pub(crate) fn fail_store(&self, store: &str) {
        self.failing.lock().insert(store.to_string());
    }

    pub(crate) fn heal(&self, store: &str) {
        self.failing.lock().remove(store);
    }

    /// Migration attempts for `store`, including failed ones.
    pub(crate) fn runs(&self, store: &str) -> usize {
        self.runs.lock().get(store).copied().unwrap_or(0)
    }

    pub(crate) fn total_runs(&self) -> usize {
        self.runs.lock().values().sum()
    }
}

#[async_trait]
impl SchemaMigrator for CountingMigrator {
    async fn migrate(&self, store_name: &str, _settings: &DatabaseSettings) -> anyhow::Result<()> {
        *self.runs.lock().entry(store_name.to_string()).or_insert(0) += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.lock().contains(store_name) {
            anyhow::bail!("permission denied for schema in {store_name}");
        }
        Ok(())
    }
}

/// Routes `tracing` output through the test harness. Honors `RUST_LOG`.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
