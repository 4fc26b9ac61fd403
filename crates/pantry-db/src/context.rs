//! # Application Context
//!
//! Tells the stores where their files live and how to open them.
//!
//! ## Platform-Specific Default Paths
//! - **macOS**: `~/Library/Application Support/com.example.pantry/`
//! - **Windows**: `%APPDATA%\example\pantry\data\`
//! - **Linux**: `~/.local/share/pantry/`
//!
//! Each store gets its own file inside the data directory
//! (`inventory_database`, `cart_database`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use pantry_core::ConflictPolicy;

use crate::config::StorageSettings;
use crate::error::{DbError, DbResult};
use crate::pool::DbConfig;

/// Environment handle passed to `get_database`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppContext {
    /// `None` keeps every store in memory.
    data_dir: Option<PathBuf>,
    on_conflict: ConflictPolicy,
    max_connections: u32,
    connect_timeout: Duration,
}

impl AppContext {
    /// Stores files under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>, on_conflict: ConflictPolicy) -> Self {
        AppContext {
            data_dir: Some(data_dir.into()),
            on_conflict,
            max_connections: 5,
            connect_timeout: Duration::from_secs(30),
        }
    }

    /// Keeps every store in memory (tests, previews).
    pub fn in_memory(on_conflict: ConflictPolicy) -> Self {
        AppContext {
            data_dir: None,
            on_conflict,
            max_connections: 1,
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Uses the platform data directory for this application.
    pub fn default_location(on_conflict: ConflictPolicy) -> DbResult<Self> {
        Ok(AppContext::new(default_data_dir()?, on_conflict))
    }

    /// Builds a context from loaded settings.
    pub fn from_settings(settings: &StorageSettings) -> DbResult<Self> {
        let data_dir = match &settings.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };

        Ok(AppContext {
            data_dir: Some(data_dir),
            on_conflict: settings.on_conflict,
            max_connections: settings.max_connections,
            connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
        })
    }

    /// Directory holding the store files, if file-backed.
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Duplicate-key policy handed to every store.
    pub fn on_conflict(&self) -> ConflictPolicy {
        self.on_conflict
    }

    /// Configuration for the store file called `file_name`.
    pub fn database_config(&self, file_name: &str) -> DbConfig {
        let config = match &self.data_dir {
            Some(dir) => DbConfig::new(dir.join(file_name), self.on_conflict)
                .max_connections(self.max_connections),
            None => DbConfig::in_memory(self.on_conflict),
        };
        config.connect_timeout(self.connect_timeout)
    }
}

fn default_data_dir() -> DbResult<PathBuf> {
    let dirs = ProjectDirs::from("com", "example", "pantry").ok_or_else(|| {
        DbError::StorageInit("could not determine app data directory".to_string())
    })?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::StorageLocation;

    #[test]
    fn test_file_config_per_store() {
        let ctx = AppContext::new("/data/pantry", ConflictPolicy::Reject);
        let config = ctx.database_config("cart_database");

        assert_eq!(
            config.location,
            StorageLocation::File(PathBuf::from("/data/pantry/cart_database"))
        );
        assert_eq!(config.on_conflict, ConflictPolicy::Reject);
    }

    #[test]
    fn test_in_memory_config() {
        let ctx = AppContext::in_memory(ConflictPolicy::Ignore);
        let config = ctx.database_config("inventory_database");

        assert_eq!(config.location, StorageLocation::InMemory);
        assert_eq!(config.on_conflict, ConflictPolicy::Ignore);
        assert!(ctx.data_dir().is_none());
    }

    #[test]
    fn test_from_settings() {
        let mut settings = StorageSettings::new(ConflictPolicy::Replace);
        settings.data_dir = Some(PathBuf::from("/srv/pantry"));
        settings.max_connections = 2;

        let ctx = AppContext::from_settings(&settings).unwrap();
        assert_eq!(ctx.data_dir(), Some(Path::new("/srv/pantry")));

        let config = ctx.database_config("inventory_database");
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.on_conflict, ConflictPolicy::Replace);
    }
}
