//! Errors raised while building or registering message stores.

/// Errors from message store construction and runtime registration.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("message store already registered: {name}")]
    AlreadyRegistered { name: String },
    #[error("invalid schema name {name:?}: expected a SQL identifier")]
    InvalidSchemaName { name: String },
}
