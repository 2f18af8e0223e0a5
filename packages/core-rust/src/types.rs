use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque name of a logical tenant.
///
/// Many tenants may share one physical database, so a `TenantId` is never
/// assumed to identify a database on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Wraps a tenant name.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the tenant name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque name of a physical database, as reported by a
/// [`DatabaseSource`](crate::DatabaseSource).
///
/// Stable for the lifetime of the physical database it names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatabaseId(String);

impl DatabaseId {
    /// Wraps a database identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty (the source did not name the database).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

macro_rules! string_id_impls {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $ty {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $ty {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id_impls!(TenantId);
string_id_impls!(DatabaseId);

/// Physical connection parameters for one database.
///
/// Accepts both URL form (`postgres://user@host:5432/orders`) and key/value
/// form (`Host=db;Port=5432;Database=orders`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Connection string handed to the storage engine verbatim.
    pub connection_string: String,
}

impl ConnectionParams {
    /// Wraps a connection string.
    #[must_use]
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
        }
    }

    /// Extracts the database name from the connection string, if present.
    ///
    /// URL form uses the first path segment; key/value form uses the
    /// `Database` or `dbname` key (case-insensitive).
    #[must_use]
    pub fn database_name(&self) -> Option<String> {
        let raw = self.connection_string.trim();
        if raw.contains("://") {
            let parsed = url::Url::parse(raw).ok()?;
            let name = parsed.path().trim_start_matches('/');
            let name = name.split('/').next().unwrap_or_default();
            return (!name.is_empty()).then(|| name.to_string());
        }

        raw.split(|c: char| c == ';' || c.is_whitespace())
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| {
                let key = key.trim();
                key.eq_ignore_ascii_case("database") || key.eq_ignore_ascii_case("dbname")
            })
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// A physical database as reported by a [`DatabaseSource`](crate::DatabaseSource).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseHandle {
    /// Stable identifier; the cache key for the database's message store.
    pub identifier: DatabaseId,
    /// Where the database lives.
    pub connection: ConnectionParams,
}

impl DatabaseHandle {
    /// Creates a handle from an identifier and a connection string.
    #[must_use]
    pub fn new(identifier: impl Into<DatabaseId>, connection_string: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            connection: ConnectionParams::new(connection_string),
        }
    }
}
