//! Connection settings for `open_with_config`.
//!
//! # Responsibility
//! - Carry the database location and per-connection pragmas.
//! - Decode from partial serde documents, defaulting missing keys.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Lock-wait deadline applied when the config does not override it.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Connection settings for `open_with_config`.
///
/// Deserializes from partial documents; missing keys take the defaults
/// below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Database file. `None` opens a private in-memory database.
    pub path: Option<PathBuf>,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout_ms: u64,
    /// Mirrors `PRAGMA foreign_keys`.
    pub foreign_keys: bool,
}

impl ConnectionConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            foreign_keys: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConnectionConfig, DEFAULT_BUSY_TIMEOUT_MS};
    use std::path::PathBuf;

    #[test]
    fn partial_document_falls_back_to_defaults() {
        let config: ConnectionConfig =
            serde_json::from_str(r#"{ "path": "/tmp/app.db" }"#).unwrap();

        assert_eq!(config.path, Some(PathBuf::from("/tmp/app.db")));
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
        assert!(config.foreign_keys);
    }

    #[test]
    fn empty_document_is_in_memory() {
        let config: ConnectionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ConnectionConfig::in_memory());
    }
}
