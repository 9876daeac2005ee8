//! Rotation index store configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where round-robin connections keep their rotation index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndexStoreConfig {
    /// Process-local map; rotation restarts at 0 with every process
    #[default]
    Memory,
    /// JSON file on disk; survives restarts
    File { path: PathBuf },
    /// SQLite database; shared by every process using the same file
    Sqlite { path: PathBuf },
}

impl IndexStoreConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File { .. } => "file",
            Self::Sqlite { .. } => "sqlite",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_store_config_tagging() {
        let cfg: IndexStoreConfig =
            serde_json::from_str(r#"{"kind":"sqlite","path":"/var/lib/rrqueue/index.db"}"#).unwrap();
        assert_eq!(cfg, IndexStoreConfig::Sqlite { path: PathBuf::from("/var/lib/rrqueue/index.db") });
        assert_eq!(cfg.kind(), "sqlite");

        let mem: IndexStoreConfig = serde_json::from_str(r#"{"kind":"memory"}"#).unwrap();
        assert_eq!(mem, IndexStoreConfig::Memory);
    }
}
