use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path, str::FromStr};
use strata_core::schema::db::ModelSchema;

const LOCK_FILE_VERSION: u32 = 1;

/// Lock file containing the model schema the last migration was generated
/// from. Successive runs diff against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFile {
    /// Lock file format version
    version: u32,

    /// The model schema
    pub schema: ModelSchema,
}

impl LockFile {
    pub fn new(schema: ModelSchema) -> Self {
        Self {
            version: LOCK_FILE_VERSION,
            schema,
        }
    }

    /// Load a lock file from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        contents.parse()
    }

    /// Load a lock file, or `None` when it does not exist yet
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Option<Self>> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => contents.parse().map(Some),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Save the lock file to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_string())?;
        Ok(())
    }
}

impl FromStr for LockFile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lock_file: LockFile = serde_json::from_str(s)?;

        if lock_file.version != LOCK_FILE_VERSION {
            bail!(
                "Unsupported lock file version: {}. Expected version {}",
                lock_file.version,
                LOCK_FILE_VERSION
            );
        }

        Ok(lock_file)
    }
}

impl fmt::Display for LockFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
        writeln!(f, "{json}")
    }
}
