//! Per-tenant message store resolution.
//!
//! [`TenantStoreCache`] maps tenants onto the message store of their
//! database, building and provisioning each store at most once.
//! [`RefreshWorker`] keeps the cache in step with databases created outside
//! of tenant resolution.

pub mod cache;
pub mod config;
pub mod configuration;
pub mod error;
pub mod refresh;
pub(crate) mod slot;
pub mod sources;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::TenantStoreCache;
pub use config::{ProvisioningFailurePolicy, TenantStoreConfig};
pub use configuration::{configure_with, ConfigurationRegistry, FnConfiguration, StoreConfiguration};
pub use error::TenancyError;
pub use refresh::RefreshWorker;
pub use slot::Readiness;
pub use sources::StaticDatabaseSource;
