//! `SchemaMigrator` implementations.
//!
//! Provides concrete backends for the [`SchemaMigrator`](super::SchemaMigrator)
//! trait: [`NullMigrator`] for testing and ephemeral stores, and
//! `PostgresMigrator` behind the `postgres` feature.

mod null;
#[cfg(feature = "postgres")]
mod postgres;

pub use null::NullMigrator;
#[cfg(feature = "postgres")]
pub use postgres::PostgresMigrator;
