//! [`DatabaseSource`] backed by a fixed tenant-to-database assignment.
//!
//! [`StaticDatabaseSource`] never creates databases: every tenant is either
//! assigned explicitly or falls through to an optional default database.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use postbox_core::{DatabaseCardinality, DatabaseHandle, DatabaseId, DatabaseSource, TenantId};

/// Fixed tenant assignments known at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticDatabaseSource {
    assignments: HashMap<TenantId, DatabaseHandle>,
    default: Option<DatabaseHandle>,
}

impl StaticDatabaseSource {
    /// Creates a source with no tenants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns `tenant` to `database`.
    #[must_use]
    pub fn with_tenant(mut self, tenant: impl Into<TenantId>, database: DatabaseHandle) -> Self {
        self.assignments.insert(tenant.into(), database);
        self
    }

    /// Database used for tenants without an explicit assignment.
    #[must_use]
    pub fn with_default(mut self, database: DatabaseHandle) -> Self {
        self.default = Some(database);
        self
    }

    /// Distinct databases, ordered by identifier.
    fn distinct_databases(&self) -> BTreeMap<DatabaseId, DatabaseHandle> {
        self.assignments
            .values()
            .chain(self.default.iter())
            .map(|handle| (handle.identifier.clone(), handle.clone()))
            .collect()
    }
}

#[async_trait]
impl DatabaseSource for StaticDatabaseSource {
    fn cardinality(&self) -> DatabaseCardinality {
        match self.distinct_databases().len() {
            0 => DatabaseCardinality::None,
            1 => DatabaseCardinality::Single,
            _ => DatabaseCardinality::StaticMultiple,
        }
    }

    async fn resolve_or_create_database(
        &self,
        tenant: &TenantId,
    ) -> anyhow::Result<DatabaseHandle> {
        self.assignments
            .get(tenant)
            .or(self.default.as_ref())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no database is assigned to tenant {tenant}"))
    }

    async fn all_databases(&self) -> anyhow::Result<Vec<DatabaseHandle>> {
        Ok(self.distinct_databases().into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(identifier: &str) -> DatabaseHandle {
        DatabaseHandle::new(identifier, format!("postgres://localhost/{identifier}"))
    }

    #[tokio::test]
    async fn resolves_assigned_tenants() {
        let source = StaticDatabaseSource::new()
            .with_tenant("acme", handle("db1"))
            .with_tenant("globex", handle("db2"));

        let acme = source
            .resolve_or_create_database(&TenantId::from("acme"))
            .await
            .unwrap();
        assert_eq!(acme.identifier.as_str(), "db1");
    }

    #[tokio::test]
    async fn unknown_tenant_without_default_is_an_error() {
        let source = StaticDatabaseSource::new().with_tenant("acme", handle("db1"));
        let err = source
            .resolve_or_create_database(&TenantId::from("initech"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("initech"));
    }

    #[tokio::test]
    async fn unknown_tenant_falls_back_to_default() {
        let source = StaticDatabaseSource::new()
            .with_tenant("acme", handle("db1"))
            .with_default(handle("shared"));
        let resolved = source
            .resolve_or_create_database(&TenantId::from("initech"))
            .await
            .unwrap();
        assert_eq!(resolved.identifier.as_str(), "shared");
    }

    #[tokio::test]
    async fn all_databases_are_distinct_and_ordered() {
        let source = StaticDatabaseSource::new()
            .with_tenant("b-tenant", handle("db2"))
            .with_tenant("a-tenant", handle("db1"))
            .with_tenant("c-tenant", handle("db1"))
            .with_default(handle("db0"));

        let ids: Vec<String> = source
            .all_databases()
            .await
            .unwrap()
            .into_iter()
            .map(|db| db.identifier.to_string())
            .collect();
        assert_eq!(ids, vec!["db0", "db1", "db2"]);
    }

    #[test]
    fn cardinality_follows_distinct_databases() {
        assert_eq!(StaticDatabaseSource::new().cardinality(), DatabaseCardinality::None);

        let single = StaticDatabaseSource::new()
            .with_tenant("acme", handle("db1"))
            .with_tenant("globex", handle("db1"));
        assert_eq!(single.cardinality(), DatabaseCardinality::Single);

        let multiple = single.with_tenant("initech", handle("db2"));
        assert_eq!(multiple.cardinality(), DatabaseCardinality::StaticMultiple);
    }
}
