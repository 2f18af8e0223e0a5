use serde::{Deserialize, Serialize};

use crate::types::ConnectionParams;

/// Provisioning policy for message store schema objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoCreate {
    /// Never touch the schema.
    None,
    /// Create missing objects; never alter existing ones.
    CreateOnly,
    /// Create missing objects and apply additive upgrades to existing ones.
    #[default]
    CreateOrUpdate,
    /// Drop and recreate the whole schema.
    All,
}

impl AutoCreate {
    /// Whether this policy ever runs a migration.
    #[must_use]
    pub fn is_enabled(self) -> bool {
        self != Self::None
    }
}

/// How tenants map onto physical databases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseCardinality {
    /// No database is involved.
    None,
    /// Every tenant lives in one database.
    Single,
    /// A fixed set of databases known at startup.
    StaticMultiple,
    /// Databases may appear at runtime, e.g. one per newly seen tenant.
    DynamicMultiple,
}

/// Static settings a message store is built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Schema holding the store's tables.
    pub schema_name: String,
    /// Whether this is the runtime's main (non-tenant) store.
    pub is_main: bool,
    /// Provisioning policy applied when the store is migrated.
    pub auto_create: AutoCreate,
    /// Whether the control-queue tables are provisioned.
    pub command_queues_enabled: bool,
    /// Where the store's database lives.
    pub connection: ConnectionParams,
}
