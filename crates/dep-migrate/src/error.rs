//! Error types for the migration library.

use thiserror::Error;

use crate::migration::Phase;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, bad option value, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Install requested for a name with no registered table unit.
    ///
    /// Fatal to the apply pass; the resolver never retries.
    #[error("No table unit registered for '{0}'")]
    UnknownTable(String),

    /// Lifecycle misuse: `up()`/`down()` called from the wrong phase.
    #[error("Invalid migration transition: {from:?} -> {to:?}")]
    InvalidTransition { from: Phase, to: Phase },

    /// A DDL call against the schema driver failed.
    ///
    /// Propagated unchanged; the core performs no rollback of
    /// already-applied steps.
    #[error("Driver error on table {table}: {message}")]
    Driver { table: String, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Driver error for a failed DDL call.
    pub fn driver(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Driver {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        // Add error chain for wrapped errors
        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_helper() {
        let err = MigrateError::driver("users", "connection reset");
        assert_eq!(
            err.to_string(),
            "Driver error on table users: connection reset"
        );
    }

    #[test]
    fn test_unknown_table_display() {
        let err = MigrateError::UnknownTable("ghost".to_string());
        assert!(err.to_string().contains("'ghost'"));
    }

    #[test]
    fn test_format_detailed_includes_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err = MigrateError::from(io);
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: IO error"));
        assert!(detailed.contains("Caused by"));
    }
}
