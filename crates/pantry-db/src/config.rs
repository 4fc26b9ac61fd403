//! # Storage Settings
//!
//! File-based configuration for the Pantry stores.
//!
//! ## Configuration File Format
//! ```toml
//! # pantry.toml
//! [storage]
//! data_dir = "/var/lib/pantry"   # optional, platform data dir when omitted
//! on_conflict = "reject"         # required: reject | replace | ignore
//! max_connections = 5
//! connect_timeout_secs = 30
//! ```
//!
//! `on_conflict` has no default on purpose: a deployment must choose what
//! a duplicate primary key means.

use std::path::{Path, PathBuf};

use pantry_core::ConflictPolicy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

/// The `[storage]` table of a settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory holding the store files. `None` = platform data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Duplicate-key policy for inserts.
    pub on_conflict: ConflictPolicy,

    /// Maximum pooled connections per store.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    storage: StorageSettings,
}

impl StorageSettings {
    /// Settings with defaults for everything except the conflict policy.
    pub fn new(on_conflict: ConflictPolicy) -> Self {
        StorageSettings {
            data_dir: None,
            on_conflict,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }

    /// Parses settings from TOML text containing a `[storage]` table.
    pub fn from_toml_str(text: &str) -> DbResult<Self> {
        let file: SettingsFile =
            toml::from_str(text).map_err(|e| DbError::InvalidConfig(e.to_string()))?;

        if file.storage.max_connections == 0 {
            return Err(DbError::InvalidConfig(
                "max_connections must be at least 1".to_string(),
            ));
        }

        Ok(file.storage)
    }

    /// Loads settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading storage settings");

        let text = std::fs::read_to_string(path).map_err(|e| {
            DbError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;

        let settings = Self::from_toml_str(&text)?;
        info!(
            path = %path.display(),
            on_conflict = %settings.on_conflict,
            "Storage settings loaded"
        );
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let settings = StorageSettings::from_toml_str(
            r#"
            [storage]
            data_dir = "/var/lib/pantry"
            on_conflict = "replace"
            max_connections = 3
            connect_timeout_secs = 10
            "#,
        )
        .unwrap();

        assert_eq!(settings.data_dir, Some(PathBuf::from("/var/lib/pantry")));
        assert_eq!(settings.on_conflict, ConflictPolicy::Replace);
        assert_eq!(settings.max_connections, 3);
        assert_eq!(settings.connect_timeout_secs, 10);
    }

    #[test]
    fn test_defaults_apply() {
        let settings = StorageSettings::from_toml_str(
            r#"
            [storage]
            on_conflict = "ignore"
            "#,
        )
        .unwrap();

        assert_eq!(settings, StorageSettings::new(ConflictPolicy::Ignore));
    }

    #[test]
    fn test_conflict_policy_is_required() {
        let err = StorageSettings::from_toml_str("[storage]\nmax_connections = 2\n").unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        let err = StorageSettings::from_toml_str("[storage]\non_conflict = \"merge\"\n").unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pantry.toml");
        std::fs::write(&path, "[storage]\non_conflict = \"reject\"\n").unwrap();

        let settings = StorageSettings::load(&path).unwrap();
        assert_eq!(settings.on_conflict, ConflictPolicy::Reject);

        assert!(StorageSettings::load(dir.path().join("missing.toml")).is_err());
    }
}
