//! Migration options loading and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

/// Options applied to every migration unit built on top of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationOptions {
    /// Default options clause appended to `CREATE TABLE` statements when
    /// a table unit passes none (e.g. "ENGINE=InnoDB" on MySQL).
    #[serde(default)]
    pub table_options: Option<String>,
}

impl MigrationOptions {
    /// Load options from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse options from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let options: MigrationOptions = serde_yaml::from_str(yaml)?;
        options.validate()?;
        Ok(options)
    }

    /// Validate the options.
    ///
    /// The table options clause is rendered verbatim into DDL, so reject
    /// anything that could smuggle in a second statement.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref opts) = self.table_options {
            if opts.contains('\0') {
                return Err(MigrateError::Config(
                    "table_options contains null byte".to_string(),
                ));
            }
            if opts.contains(';') {
                return Err(MigrateError::Config(format!(
                    "table_options must be a single clause, found ';': {:?}",
                    opts
                )));
            }
        }
        Ok(())
    }
}
