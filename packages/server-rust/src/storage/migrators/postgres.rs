//! `PostgreSQL` [`SchemaMigrator`] implementation.
//!
//! Creates the incoming, outgoing and dead-letter envelope tables (plus the
//! control queue when command queues are enabled) inside the store's schema.
//! Each migration opens a short-lived single-connection pool and runs all DDL
//! in one transaction.

use std::time::Duration;

use async_trait::async_trait;
use postbox_core::{AutoCreate, DatabaseSettings};
use sqlx::postgres::PgPoolOptions;
use tracing::debug;

use crate::storage::migrator::SchemaMigrator;
use crate::storage::schema::validate_schema_name;

/// `SchemaMigrator` that provisions envelope tables in `PostgreSQL`.
#[derive(Debug, Clone)]
pub struct PostgresMigrator {
    acquire_timeout: Duration,
}

impl PostgresMigrator {
    /// Creates a migrator that waits at most `acquire_timeout` for a connection.
    #[must_use]
    pub fn new(acquire_timeout: Duration) -> Self {
        Self { acquire_timeout }
    }
}

impl Default for PostgresMigrator {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

/// Table definitions, in creation order.
fn table_statements(schema: &str, command_queues_enabled: bool) -> Vec<String> {
    let mut statements = vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {schema}.postbox_incoming_envelopes (
                id UUID PRIMARY KEY,
                status VARCHAR NOT NULL,
                owner_id INTEGER NOT NULL,
                execution_time TIMESTAMPTZ NULL,
                attempts INTEGER NOT NULL DEFAULT 0,
                body BYTEA NOT NULL,
                message_type VARCHAR NOT NULL,
                received_at VARCHAR NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {schema}.postbox_outgoing_envelopes (
                id UUID PRIMARY KEY,
                owner_id INTEGER NOT NULL,
                destination VARCHAR NOT NULL,
                deliver_by TIMESTAMPTZ NULL,
                body BYTEA NOT NULL,
                attempts INTEGER NOT NULL DEFAULT 0,
                message_type VARCHAR NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {schema}.postbox_dead_letters (
                id UUID PRIMARY KEY,
                execution_time TIMESTAMPTZ NULL,
                body BYTEA NOT NULL,
                message_type VARCHAR NOT NULL,
                received_at VARCHAR NULL,
                source VARCHAR NULL,
                exception_type VARCHAR NULL,
                exception_message VARCHAR NULL,
                sent_at TIMESTAMPTZ NULL,
                replayable BOOLEAN NOT NULL DEFAULT FALSE
            )"
        ),
    ];

    if command_queues_enabled {
        statements.push(format!(
            "CREATE TABLE IF NOT EXISTS {schema}.postbox_control_queue (
                id UUID PRIMARY KEY,
                message_type VARCHAR NOT NULL,
                node_id UUID NOT NULL,
                body BYTEA NOT NULL,
                posted TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                expires TIMESTAMPTZ NULL
            )"
        ));
    }

    statements
}

/// Additive upgrades for tables created by older versions.
fn upgrade_statements(schema: &str) -> Vec<String> {
    vec![
        format!(
            "ALTER TABLE {schema}.postbox_incoming_envelopes \
             ADD COLUMN IF NOT EXISTS keep_until TIMESTAMPTZ NULL"
        ),
        format!(
            "ALTER TABLE {schema}.postbox_dead_letters \
             ADD COLUMN IF NOT EXISTS expires TIMESTAMPTZ NULL"
        ),
    ]
}

/// Full DDL plan for a migration under the given policy.
fn migration_plan(settings: &DatabaseSettings) -> Vec<String> {
    let schema = settings.schema_name.as_str();
    let mut plan = Vec::new();

    match settings.auto_create {
        AutoCreate::None => return plan,
        AutoCreate::All => plan.push(format!("DROP SCHEMA IF EXISTS {schema} CASCADE")),
        AutoCreate::CreateOnly | AutoCreate::CreateOrUpdate => {}
    }

    plan.push(format!("CREATE SCHEMA IF NOT EXISTS {schema}"));
    plan.extend(table_statements(schema, settings.command_queues_enabled));

    if settings.auto_create == AutoCreate::CreateOrUpdate {
        plan.extend(upgrade_statements(schema));
    }

    plan
}

#[async_trait]
impl SchemaMigrator for PostgresMigrator {
    async fn migrate(&self, store_name: &str, settings: &DatabaseSettings) -> anyhow::Result<()> {
        validate_schema_name(&settings.schema_name)?;
        let plan = migration_plan(settings);
        if plan.is_empty() {
            return Ok(());
        }

        // Avoid logging the connection string; it may carry credentials.
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(self.acquire_timeout)
            .connect(&settings.connection.connection_string)
            .await?;

        let mut tx = pool.begin().await?;
        for statement in &plan {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        pool.close().await;

        debug!(
            store = store_name,
            schema = %settings.schema_name,
            statements = plan.len(),
            "postgres schema migrated"
        );
        Ok(())
    }
}
