//! Errors surfaced by the tenant store cache.

use postbox_core::TenantId;

use crate::storage::StoreError;

/// Errors from resolving, refreshing or configuring tenant message stores.
///
/// Nothing here is retried internally; the next call starts from scratch.
#[derive(Debug, thiserror::Error)]
pub enum TenancyError {
    #[error("failed to resolve database for tenant {tenant}: {source}")]
    Enumeration {
        tenant: TenantId,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to enumerate databases: {0}")]
    Discovery(#[source] anyhow::Error),
    #[error("failed to provision message store {store}: {source}")]
    Provisioning {
        store: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("configuration action #{index} failed for message store {store}: {source}")]
    Configuration {
        store: String,
        index: usize,
        #[source]
        source: anyhow::Error,
    },
    #[error("message store {store} was unpublished after failed provisioning: {reason}")]
    Unpublished { store: String, reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}
