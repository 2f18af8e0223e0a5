//! Factory for creating un-initialized [`MessageStore`] instances.
//!
//! [`MessageStoreFactory`] is the dependency injection point that binds a
//! physical [`DatabaseHandle`] to the static [`StoreTemplate`] settings and a
//! shared [`SchemaMigrator`]. Construction is pure: no connection is opened
//! and nothing is registered with the runtime.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use postbox_core::{AutoCreate, DatabaseHandle, DatabaseSettings, MessageStore};

use super::error::StoreError;
use super::message_store::DatabaseMessageStore;
use super::migrator::SchemaMigrator;
use super::schema::validate_schema_name;

/// Static settings shared by every store a factory builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreTemplate {
    /// Schema holding each store's tables.
    pub schema_name: String,
    /// Provisioning policy stamped onto each store.
    pub auto_create: AutoCreate,
    /// Whether control-queue tables are provisioned.
    pub command_queues_enabled: bool,
}

impl StoreTemplate {
    /// Template for tenant stores: command queues disabled.
    #[must_use]
    pub fn new(schema_name: impl Into<String>, auto_create: AutoCreate) -> Self {
        Self {
            schema_name: schema_name.into(),
            auto_create,
            command_queues_enabled: false,
        }
    }
}

/// Factory for per-database [`MessageStore`] instances.
pub struct MessageStoreFactory {
    template: StoreTemplate,
    migrator: Arc<dyn SchemaMigrator>,
    created: AtomicU64,
}

impl MessageStoreFactory {
    /// Creates a new factory with the given template.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidSchemaName`] if the template's schema name
    /// is not a plain SQL identifier.
    pub fn new(
        template: StoreTemplate,
        migrator: Arc<dyn SchemaMigrator>,
    ) -> Result<Self, StoreError> {
        validate_schema_name(&template.schema_name)?;
        Ok(Self {
            template,
            migrator,
            created: AtomicU64::new(0),
        })
    }

    /// Creates a store bound to `database`.
    ///
    /// The store is named after the database identifier, falling back to the
    /// database name in the connection string and then to the schema name.
    #[must_use]
    pub fn create(&self, database: &DatabaseHandle) -> Arc<dyn MessageStore> {
        let settings = DatabaseSettings {
            schema_name: self.template.schema_name.clone(),
            is_main: false,
            auto_create: self.template.auto_create,
            command_queues_enabled: self.template.command_queues_enabled,
            connection: database.connection.clone(),
        };
        let store = DatabaseMessageStore::new(
            store_name(database, &self.template.schema_name),
            settings,
            Arc::clone(&self.migrator),
        );
        self.created.fetch_add(1, Ordering::SeqCst);
        Arc::new(store)
    }

    /// Number of stores this factory has constructed.
    #[must_use]
    pub fn created_count(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }
}

fn store_name(database: &DatabaseHandle, schema_name: &str) -> String {
    if !database.identifier.is_empty() {
        return database.identifier.to_string();
    }
    database
        .connection
        .database_name()
        .unwrap_or_else(|| schema_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrators::NullMigrator;

    fn factory(auto_create: AutoCreate) -> MessageStoreFactory {
        MessageStoreFactory::new(StoreTemplate::new("postbox", auto_create), Arc::new(NullMigrator))
            .unwrap()
    }

    #[test]
    fn create_binds_connection_and_template() {
        let factory = factory(AutoCreate::CreateOnly);
        let store = factory.create(&DatabaseHandle::new("db1", "postgres://localhost/tenant_one"));

        assert_eq!(store.name(), "db1");
        let settings = store.settings();
        assert_eq!(settings.schema_name, "postbox");
        assert_eq!(settings.auto_create, AutoCreate::CreateOnly);
        assert!(!settings.is_main);
        assert!(!settings.command_queues_enabled);
        assert_eq!(
            settings.connection.connection_string,
            "postgres://localhost/tenant_one"
        );
    }

    #[test]
    fn name_falls_back_to_connection_database() {
        let factory = factory(AutoCreate::None);
        let store = factory.create(&DatabaseHandle::new("", "Host=localhost;Database=orders"));
        assert_eq!(store.name(), "orders");
    }

    #[test]
    fn name_falls_back_to_schema_when_nothing_else_is_known() {
        let factory = factory(AutoCreate::None);
        let store = factory.create(&DatabaseHandle::new("", "Host=localhost"));
        assert_eq!(store.name(), "postbox");
    }

    #[test]
    fn factory_counts_constructions() {
        let factory = factory(AutoCreate::None);
        assert_eq!(factory.created_count(), 0);

        let a = factory.create(&DatabaseHandle::new("db1", "Host=a"));
        let b = factory.create(&DatabaseHandle::new("db1", "Host=a"));

        assert_eq!(factory.created_count(), 2);
        assert!(!Arc::ptr_eq(&a, &b), "every call builds a fresh store");
    }

    #[test]
    fn invalid_schema_name_is_rejected() {
        let result = MessageStoreFactory::new(
            StoreTemplate::new("bad schema", AutoCreate::None),
            Arc::new(NullMigrator),
        );
        assert!(matches!(result, Err(StoreError::InvalidSchemaName { .. })));
    }
}
