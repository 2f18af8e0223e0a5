//! Message store construction, wiring and schema provisioning.
//!
//! - [`MessageStoreFactory`]: pure construction of a store bound to one
//!   physical database
//! - [`StoreInitializer`]: runtime registration and policy-gated migration
//! - [`SchemaMigrator`]: storage-engine specific DDL, with implementations
//!   in [`migrators`]

pub mod error;
pub mod factory;
pub mod initializer;
pub mod message_store;
pub mod migrator;
pub mod migrators;
pub mod schema;

pub use error::StoreError;
pub use factory::{MessageStoreFactory, StoreTemplate};
pub use initializer::StoreInitializer;
pub use message_store::DatabaseMessageStore;
pub use migrator::SchemaMigrator;
pub use schema::validate_schema_name;
