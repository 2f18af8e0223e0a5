//! Postbox Core: tenant and database identities, message store settings,
//! and the collaborator traits the tenant store cache is built against.

pub mod settings;
pub mod traits;
pub mod types;

pub use settings::{AutoCreate, DatabaseCardinality, DatabaseSettings};
pub use traits::{DatabaseSource, MessageStore, MessageStoreAdmin};
pub use types::{ConnectionParams, DatabaseHandle, DatabaseId, TenantId};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
