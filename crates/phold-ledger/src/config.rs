use std::fs;
use std::path::Path;

use phold_log::LogConfig;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// How placeholder paths are compared when folding records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathCase {
    /// `A.txt` and `a.txt` are the same placeholder.
    #[default]
    Insensitive,
    Sensitive,
}

impl PathCase {
    /// The comparison key for `path`.
    pub fn key(self, path: &str) -> String {
        match self {
            PathCase::Insensitive => path.to_lowercase(),
            PathCase::Sensitive => path.to_string(),
        }
    }
}

/// Configuration for a [`PlaceholderLedger`](crate::PlaceholderLedger).
///
/// ```toml
/// path_case = "insensitive"
///
/// [log]
/// sync_mode = "every_write"
/// tail_policy = "truncate"
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub log: LogConfig,
    pub path_case: PathCase,
}

impl LedgerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> LedgerResult<Self> {
        toml::from_str(contents).map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> LedgerResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }
}
