//! No-op [`SchemaMigrator`] implementation.
//!
//! [`NullMigrator`] accepts every migration without touching any database.
//! Useful for testing and for stores whose schema is managed out of band.

use async_trait::async_trait;
use postbox_core::DatabaseSettings;

use crate::storage::migrator::SchemaMigrator;

/// No-op `SchemaMigrator` for testing and externally managed schemas.
pub struct NullMigrator;

#[async_trait]
impl SchemaMigrator for NullMigrator {
    async fn migrate(&self, _store_name: &str, _settings: &DatabaseSettings) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use postbox_core::{AutoCreate, ConnectionParams};

    use super::*;

    #[tokio::test]
    async fn migrate_returns_ok() {
        let settings = DatabaseSettings {
            schema_name: "postbox".to_string(),
            is_main: false,
            auto_create: AutoCreate::All,
            command_queues_enabled: false,
            connection: ConnectionParams::new("Host=localhost"),
        };
        assert!(NullMigrator.migrate("db1", &settings).await.is_ok());
    }
}
