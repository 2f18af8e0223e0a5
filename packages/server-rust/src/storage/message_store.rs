//! Database-backed [`MessageStore`] implementation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use postbox_core::{DatabaseSettings, MessageStore, MessageStoreAdmin};
use tracing::info_span;
use tracing::Instrument;

use super::migrator::SchemaMigrator;

/// Message store bound to one physical database.
///
/// Holds the settings it was built with and delegates schema administration
/// to a shared [`SchemaMigrator`]. Construction performs no I/O.
pub struct DatabaseMessageStore {
    name: String,
    settings: DatabaseSettings,
    migrator: Arc<dyn SchemaMigrator>,
    completed_migrations: AtomicU64,
}

impl DatabaseMessageStore {
    /// Creates an un-migrated store.
    #[must_use]
    pub fn new(
        name: String,
        settings: DatabaseSettings,
        migrator: Arc<dyn SchemaMigrator>,
    ) -> Self {
        Self {
            name,
            settings,
            migrator,
            completed_migrations: AtomicU64::new(0),
        }
    }
}

impl fmt::Debug for DatabaseMessageStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseMessageStore")
            .field("name", &self.name)
            .field("schema_name", &self.settings.schema_name)
            .field("auto_create", &self.settings.auto_create)
            .field("completed_migrations", &self.completed_migrations())
            .finish_non_exhaustive()
    }
}

impl MessageStore for DatabaseMessageStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn settings(&self) -> &DatabaseSettings {
        &self.settings
    }

    fn admin(&self) -> &dyn MessageStoreAdmin {
        self
    }
}

#[async_trait]
impl MessageStoreAdmin for DatabaseMessageStore {
    async fn migrate(&self) -> anyhow::Result<()> {
        let span = info_span!(
            "migrate",
            store = %self.name,
            schema = %self.settings.schema_name,
        );
        self.migrator
            .migrate(&self.name, &self.settings)
            .instrument(span)
            .await?;
        self.completed_migrations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn completed_migrations(&self) -> u64 {
        self.completed_migrations.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use postbox_core::{AutoCreate, ConnectionParams};

    use super::*;
    use crate::storage::migrators::NullMigrator;

    /// Migrator that records every call and optionally fails.
    struct RecordingMigrator {
        calls: Mutex<Vec<(String, AutoCreate)>>,
        fail: bool,
    }

    #[async_trait]
    impl SchemaMigrator for RecordingMigrator {
        async fn migrate(
            &self,
            store_name: &str,
            settings: &DatabaseSettings,
        ) -> anyhow::Result<()> {
            self.calls
                .lock()
                .push((store_name.to_string(), settings.auto_create));
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(())
        }
    }

    fn settings() -> DatabaseSettings {
        DatabaseSettings {
            schema_name: "postbox".to_string(),
            is_main: false,
            auto_create: AutoCreate::CreateOnly,
            command_queues_enabled: false,
            connection: ConnectionParams::new("Host=localhost;Database=db1"),
        }
    }

    #[tokio::test]
    async fn migrate_delegates_to_migrator_and_counts() {
        let migrator = Arc::new(RecordingMigrator {
            calls: Mutex::new(Vec::new()),
            fail: false,
        });
        let store = DatabaseMessageStore::new("db1".to_string(), settings(), migrator.clone());

        store.admin().migrate().await.unwrap();
        store.admin().migrate().await.unwrap();

        assert_eq!(store.admin().completed_migrations(), 2);
        assert_eq!(
            migrator.calls.lock().clone(),
            vec![
                ("db1".to_string(), AutoCreate::CreateOnly),
                ("db1".to_string(), AutoCreate::CreateOnly),
            ]
        );
    }

    #[tokio::test]
    async fn failed_migration_is_not_counted() {
        let migrator = Arc::new(RecordingMigrator {
            calls: Mutex::new(Vec::new()),
            fail: true,
        });
        let store = DatabaseMessageStore::new("db1".to_string(), settings(), migrator);

        let err = store.admin().migrate().await.unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(store.admin().completed_migrations(), 0);
    }

    #[test]
    fn exposes_name_and_settings() {
        let store =
            DatabaseMessageStore::new("db1".to_string(), settings(), Arc::new(NullMigrator));
        assert_eq!(store.name(), "db1");
        assert_eq!(store.settings().schema_name, "postbox");
        assert!(format!("{store:?}").contains("db1"));
    }
}
