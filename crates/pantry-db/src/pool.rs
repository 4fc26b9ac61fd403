//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  DbConfig::new(path, policy) ← Configure pool settings                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  connect(&config, &MIGRATOR, "inventory") ← Create pool + migrate      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Repository calls and live query re-evaluations share the pool         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! File databases use WAL (Write-Ahead Logging):
//! - Readers don't block writers
//! - Writers don't block readers
//! - Better crash recovery
//!
//! In-memory databases live inside a single connection, so their pool is
//! pinned to exactly one connection that is never recycled.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use pantry_core::ConflictPolicy;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;

// =============================================================================
// Configuration
// =============================================================================

/// Where the store keeps its rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    /// A SQLite file, created if missing.
    File(PathBuf),
    /// A private in-memory database (tests, scratch stores).
    InMemory,
}

/// Database configuration.
///
/// The conflict policy has no default and must be chosen when the
/// configuration is built.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/inventory_database", ConflictPolicy::Reject)
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// File path or in-memory.
    pub location: StorageLocation,

    /// What `insert` does with a duplicate primary key.
    pub on_conflict: ConflictPolicy,

    /// Maximum number of connections in the pool.
    /// Default: 5 (forced to 1 in memory)
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection acquire timeout.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection (file databases only).
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a file-backed configuration.
    ///
    /// ## Arguments
    /// * `path` - Path to the SQLite database file. Created if it doesn't exist,
    ///   along with missing parent directories.
    /// * `on_conflict` - Duplicate-key policy for inserts
    pub fn new(path: impl Into<PathBuf>, on_conflict: ConflictPolicy) -> Self {
        DbConfig {
            location: StorageLocation::File(path.into()),
            on_conflict,
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// Every call yields an isolated database; its contents disappear when
    /// the store is closed.
    pub fn in_memory(on_conflict: ConflictPolicy) -> Self {
        DbConfig {
            location: StorageLocation::InMemory,
            on_conflict,
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the conflict policy.
    pub fn on_conflict(mut self, policy: ConflictPolicy) -> Self {
        self.on_conflict = policy;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Returns the database file path, if file-backed.
    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            StorageLocation::File(path) => Some(path),
            StorageLocation::InMemory => None,
        }
    }
}

// =============================================================================
// Connect
// =============================================================================

/// Opens a pool for one store and applies that store's migrations.
///
/// ## What This Does
/// 1. Creates the parent directory and database file if missing
/// 2. Configures SQLite: WAL + NORMAL sync for files, foreign keys on
/// 3. Creates the connection pool
/// 4. Runs migrations (if enabled)
///
/// Every failure here is reported as [`DbError::StorageInit`].
pub(crate) async fn connect(
    config: &DbConfig,
    migrator: &'static Migrator,
    store: &'static str,
) -> DbResult<SqlitePool> {
    let pool_options = match &config.location {
        StorageLocation::File(path) => {
            info!(store, path = %path.display(), "Opening database file");

            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    DbError::StorageInit(format!(
                        "cannot create data directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }

            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .acquire_timeout(config.connect_timeout)
                .idle_timeout(Some(config.idle_timeout))
        }
        StorageLocation::InMemory => {
            info!(store, "Opening in-memory database");

            // The database lives and dies with its only connection
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(config.connect_timeout)
                .idle_timeout(None)
                .max_lifetime(None)
        }
    };

    let connect_options = connect_options(&config.location)?;
    debug!(store, "Connection options configured");

    let pool = pool_options
        .connect_with(connect_options)
        .await
        .map_err(|e| DbError::StorageInit(e.to_string()))?;

    info!(
        store,
        max_connections = config.max_connections,
        on_conflict = %config.on_conflict,
        "Database pool created"
    );

    if config.run_migrations {
        if let Err(e) = migrations::run_migrations(&pool, migrator, store).await {
            pool.close().await;
            return Err(e);
        }
    }

    Ok(pool)
}

fn connect_options(location: &StorageLocation) -> DbResult<SqliteConnectOptions> {
    let options = match location {
        StorageLocation::File(path) => SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            // WAL mode: Better concurrent read performance
            .journal_mode(SqliteJournalMode::Wal)
            // NORMAL synchronous: Good balance of durability and speed
            .synchronous(SqliteSynchronous::Normal),
        StorageLocation::InMemory => SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| DbError::StorageInit(e.to_string()))?,
    };

    // SQLite has foreign keys disabled by default for backwards compatibility
    Ok(options.foreign_keys(true))
}

// =============================================================================
// Unit Tests
// =============================================================================
