//! Schema identifier validation.
//!
//! Schema names are spliced into DDL, so they are restricted to plain
//! (unquoted) SQL identifiers.

use std::sync::OnceLock;

use regex::Regex;

use super::error::StoreError;

/// Longest identifier `PostgreSQL` keeps without truncation.
const MAX_IDENTIFIER_LEN: usize = 63;

fn identifier_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok())
        .as_ref()
}

/// Checks that `name` can be used as an unquoted schema identifier.
///
/// # Errors
///
/// Returns [`StoreError::InvalidSchemaName`] if the name is empty, too long,
/// or contains anything other than ASCII letters, digits and underscores.
pub fn validate_schema_name(name: &str) -> Result<(), StoreError> {
    let matches = identifier_pattern().is_some_and(|pattern| pattern.is_match(name));
    if name.len() > MAX_IDENTIFIER_LEN || !matches {
        return Err(StoreError::InvalidSchemaName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert!(validate_schema_name("postbox").is_ok());
        assert!(validate_schema_name("_tenant_01").is_ok());
    }

    #[test]
    fn rejects_injection_and_empty_names() {
        assert!(validate_schema_name("").is_err());
        assert!(validate_schema_name("1abc").is_err());
        assert!(validate_schema_name("public; drop table x").is_err());
        assert!(validate_schema_name("\"quoted\"").is_err());
    }

    #[test]
    fn rejects_overlong_names() {
        let name = "a".repeat(MAX_IDENTIFIER_LEN + 1);
        assert!(validate_schema_name(&name).is_err());
        assert!(validate_schema_name(&name[..MAX_IDENTIFIER_LEN]).is_ok());
    }

    proptest! {
        #[test]
        fn names_with_punctuation_are_rejected(
            prefix in "[a-z]{1,8}",
            bad in "[ ;.\\-'\"()]",
        ) {
            let name = format!("{prefix}{bad}x");
            prop_assert!(validate_schema_name(&name).is_err());
        }
    }
}
