use postbox_core::AutoCreate;

/// What happens to a store whose configuration or migration failed after it
/// was published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProvisioningFailurePolicy {
    /// Keep the store in both lookup maps. Later resolutions return it and
    /// callers may re-run its migration.
    #[default]
    LeavePublished,
    /// Remove the store from both lookup maps and from the runtime. The next
    /// resolution provisions the database from scratch.
    Unpublish,
}

/// Configuration for a [`TenantStoreCache`](super::TenantStoreCache).
#[derive(Debug, Clone)]
pub struct TenantStoreConfig {
    /// Schema holding each tenant store's tables.
    pub schema_name: String,
    /// Provisioning policy for stores created by `resolve`.
    pub auto_create: AutoCreate,
    /// Handling of stores whose provisioning failed.
    pub failure_policy: ProvisioningFailurePolicy,
}

impl Default for TenantStoreConfig {
    fn default() -> Self {
        Self {
            schema_name: "postbox".to_string(),
            auto_create: AutoCreate::CreateOrUpdate,
            failure_policy: ProvisioningFailurePolicy::LeavePublished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_store_config_defaults() {
        let config = TenantStoreConfig::default();
        assert_eq!(config.schema_name, "postbox");
        assert_eq!(config.auto_create, AutoCreate::CreateOrUpdate);
        assert_eq!(config.failure_policy, ProvisioningFailurePolicy::LeavePublished);
    }
}
