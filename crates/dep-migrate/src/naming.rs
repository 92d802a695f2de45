//! Identifier validation, quoting, and naming-convention helpers.
//!
//! Constraint and index names are synthesized from the table and column
//! names they cover, so a migration never has to invent them by hand:
//!
//! - foreign keys: `{table}_{columns}_fkey`
//! - primary keys: `{table}_pk`
//! - indexes: `{table}_{columns}_idx`
//!
//! Names longer than the PostgreSQL identifier limit are clamped by
//! replacing the tail with a SHA-256 digest fragment of the full name,
//! keeping the result deterministic and collision-resistant.
//!
//! These helpers are stateless and carry no dependency logic.

use sha2::{Digest, Sha256};

use crate::error::{MigrateError, Result};

/// Maximum length for synthesized identifiers (PostgreSQL limit: 63 bytes).
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Hex digits of the SHA-256 digest appended when clamping long names.
const HASH_SUFFIX_LEN: usize = 16;

/// Validate an identifier supplied by a caller.
///
/// Rejects:
/// - Empty identifiers
/// - Identifiers containing null bytes (injection vector)
/// - Identifiers exceeding the maximum length
///
/// # Errors
///
/// Returns `MigrateError::Config` with a descriptive message.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Config(
            "Identifier cannot be empty".to_string(),
        ));
    }

    if name.contains('\0') {
        return Err(MigrateError::Config(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Quote an identifier with double quotes, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Synthesize a foreign-key constraint name: `{table}_{columns}_fkey`.
pub fn foreign_key_name(table: &str, columns: &[String]) -> String {
    clamp(&format!("{}_{}_fkey", table, columns.join("_")))
}

/// Synthesize a primary-key constraint name: `{table}_pk`.
pub fn primary_key_name(table: &str) -> String {
    clamp(&format!("{}_pk", table))
}

/// Synthesize an index name: `{table}_{columns}_idx`.
pub fn index_name(table: &str, columns: &[String]) -> String {
    clamp(&format!("{}_{}_idx", table, columns.join("_")))
}

/// Clamp a synthesized name to [`MAX_IDENTIFIER_LENGTH`] bytes.
///
/// Over-long names keep a readable prefix and end with `_` plus the
/// first [`HASH_SUFFIX_LEN`] hex digits of the SHA-256 digest of the
/// full name. Two distinct long names therefore clamp to distinct
/// identifiers, and the same name always clamps the same way.
fn clamp(name: &str) -> String {
    if name.len() <= MAX_IDENTIFIER_LENGTH {
        return name.to_string();
    }

    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    // Respect char boundaries for multi-byte table/column names.
    let mut prefix_len = MAX_IDENTIFIER_LENGTH - HASH_SUFFIX_LEN - 1;
    while !name.is_char_boundary(prefix_len) {
        prefix_len -= 1;
    }

    format!("{}_{}", &name[..prefix_len], &digest[..HASH_SUFFIX_LEN])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn test_validate_identifier_normal() {
        assert!(validate_identifier("users").is_ok());
        assert!(validate_identifier("my_table").is_ok());
        assert!(validate_identifier("Table123").is_ok());
    }

    #[test]
    fn test_validate_identifier_rejects_empty() {
        let result = validate_identifier("");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[test]
    fn test_validate_identifier_rejects_null_byte() {
        let result = validate_identifier("table\0name");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("null byte"));
    }

    #[test]
    fn test_validate_identifier_rejects_too_long() {
        let long_name = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        assert!(validate_identifier(&long_name).is_err());
        let max_name = "a".repeat(MAX_IDENTIFIER_LENGTH);
        assert!(validate_identifier(&max_name).is_ok());
    }

    // =========================================================================
    // Quoting tests
    // =========================================================================

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("table\"name"), "\"table\"\"name\"");
    }

    // =========================================================================
    // Name synthesis tests
    // =========================================================================

    #[test]
    fn test_foreign_key_name() {
        assert_eq!(
            foreign_key_name("post", &cols(&["user_id"])),
            "post_user_id_fkey"
        );
        assert_eq!(
            foreign_key_name("post", &cols(&["user_id", "blog_id"])),
            "post_user_id_blog_id_fkey"
        );
    }

    #[test]
    fn test_primary_key_name() {
        assert_eq!(primary_key_name("users"), "users_pk");
    }

    #[test]
    fn test_index_name() {
        assert_eq!(
            index_name("users", &cols(&["email", "status"])),
            "users_email_status_idx"
        );
    }

    #[test]
    fn test_long_names_are_clamped() {
        let table = "a_very_long_table_name_that_goes_on_and_on_forever";
        let name = index_name(table, &cols(&["first_column", "second_column"]));
        assert!(name.len() <= MAX_IDENTIFIER_LENGTH);
        assert!(name.contains('_'));
    }

    #[test]
    fn test_clamp_is_deterministic() {
        let table = "t".repeat(80);
        let a = primary_key_name(&table);
        let b = primary_key_name(&table);
        assert_eq!(a, b);
    }

    #[test]
    fn test_clamp_distinguishes_long_names() {
        // Shared prefix longer than the limit, differing only at the tail.
        let base = "x".repeat(70);
        let a = primary_key_name(&format!("{}a", base));
        let b = primary_key_name(&format!("{}b", base));
        assert_ne!(a, b);
        assert_eq!(&a[..10], &b[..10]);
    }
}
