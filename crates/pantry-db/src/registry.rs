//! # Store Registry
//!
//! Process-wide, construct-once ownership of a database container.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Registry State Machine                             │
//! │                                                                         │
//! │   Uninitialized ──get_or_open──► Initializing ──ok──► Ready            │
//! │        ▲                              │                  │              │
//! │        └──────────── error ───────────┘                  │ close()      │
//! │                                                          ▼              │
//! │   Initializing ◄──────────── get_or_open ───────────── Closed          │
//! │                                                                         │
//! │  get_or_open (double-checked):                                         │
//! │    1. read-lock slot, Ready? → clone Arc, done                         │
//! │    2. acquire init guard (async mutex)                                 │
//! │    3. re-check slot, Ready? → clone Arc, done                          │
//! │    4. D::open(config)  (exactly one caller gets here at a time)        │
//! │    5. publish Arc in slot, release guard                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An instance that was closed directly (not through the registry) counts as
//! Closed: `get` stops returning it and `get_or_open` builds a replacement.
//!
//! Concurrent callers that arrive during construction wait on the init guard
//! and then take the fast path, so every caller observes the same `Arc`.
//! Construction errors are returned to the caller that ran the construction;
//! nothing is retried automatically.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::DbResult;
use crate::pool::DbConfig;

// =============================================================================
// Store Trait
// =============================================================================

/// A database container the registry can construct and tear down.
#[async_trait]
pub trait Store: Send + Sync + Sized + 'static {
    /// Short name used in logs ("inventory", "cart").
    const NAME: &'static str;

    /// Opens the storage and returns a ready container.
    async fn open(config: DbConfig) -> DbResult<Self>;

    /// Releases the underlying storage handle.
    async fn shutdown(&self);

    /// True once the storage handle has been released, by [`shutdown`](Self::shutdown)
    /// or by the container's own close.
    fn is_closed(&self) -> bool;
}

// =============================================================================
// Registry State
// =============================================================================

/// Observable lifecycle state of a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    /// No instance has been constructed.
    Uninitialized,
    /// A caller is constructing the instance.
    Initializing,
    /// An instance is available.
    Ready,
    /// The instance was torn down; the next access constructs a new one.
    Closed,
}

impl fmt::Display for RegistryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryState::Uninitialized => write!(f, "uninitialized"),
            RegistryState::Initializing => write!(f, "initializing"),
            RegistryState::Ready => write!(f, "ready"),
            RegistryState::Closed => write!(f, "closed"),
        }
    }
}

enum Slot<D> {
    Uninitialized,
    Ready(Arc<D>),
    Closed,
}

// =============================================================================
// Registry
// =============================================================================

/// Holds at most one live instance of `D`.
///
/// ## Usage
/// ```rust,ignore
/// static INVENTORY: Lazy<Registry<InventoryDatabase>> = Lazy::new(Registry::new);
///
/// let db = INVENTORY.get_or_open(DbConfig::new(path, ConflictPolicy::Reject)).await?;
/// let same = INVENTORY.get_or_open(DbConfig::new(path, ConflictPolicy::Reject)).await?;
/// assert!(Arc::ptr_eq(&db, &same));
///
/// INVENTORY.close().await;
/// ```
pub struct Registry<D: Store> {
    slot: RwLock<Slot<D>>,
    init_guard: Mutex<()>,
    initializing: AtomicBool,
}

impl<D: Store> Registry<D> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Registry {
            slot: RwLock::new(Slot::Uninitialized),
            init_guard: Mutex::new(()),
            initializing: AtomicBool::new(false),
        }
    }

    /// Returns the live instance without constructing one.
    pub fn get(&self) -> Option<Arc<D>> {
        match &*self.read_slot() {
            Slot::Ready(db) if !db.is_closed() => Some(Arc::clone(db)),
            Slot::Ready(_) | Slot::Uninitialized | Slot::Closed => None,
        }
    }

    /// Returns the live instance, constructing it from `config` if needed.
    ///
    /// `config` is ignored when an instance already exists.
    pub async fn get_or_open(&self, config: DbConfig) -> DbResult<Arc<D>> {
        if let Some(db) = self.get() {
            return Ok(db);
        }

        let _guard = self.init_guard.lock().await;

        // Another caller may have finished construction while we waited
        if let Some(db) = self.get() {
            debug!(store = D::NAME, "Store constructed by concurrent caller");
            return Ok(db);
        }

        info!(store = D::NAME, "Constructing store instance");
        let opened = {
            let _flag = InitFlag::raise(&self.initializing);
            D::open(config).await
        };

        match opened {
            Ok(db) => {
                let db = Arc::new(db);
                *self.write_slot() = Slot::Ready(Arc::clone(&db));
                info!(store = D::NAME, "Store ready");
                Ok(db)
            }
            Err(e) => {
                warn!(store = D::NAME, error = %e, "Store construction failed");
                Err(e)
            }
        }
    }

    /// Tears down the live instance, if any.
    ///
    /// Idempotent: closing a registry that is not Ready does nothing.
    /// Callers still holding an `Arc` see `DbError::Closed` from then on.
    pub async fn close(&self) {
        let _guard = self.init_guard.lock().await;

        let previous = {
            let mut slot = self.write_slot();
            if !matches!(*slot, Slot::Ready(_)) {
                return;
            }
            std::mem::replace(&mut *slot, Slot::Closed)
        };

        if let Slot::Ready(db) = previous {
            info!(store = D::NAME, "Closing store instance");
            db.shutdown().await;
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RegistryState {
        if self.initializing.load(Ordering::SeqCst) {
            return RegistryState::Initializing;
        }

        match &*self.read_slot() {
            Slot::Uninitialized => RegistryState::Uninitialized,
            Slot::Ready(db) if db.is_closed() => RegistryState::Closed,
            Slot::Ready(_) => RegistryState::Ready,
            Slot::Closed => RegistryState::Closed,
        }
    }

    fn read_slot(&self) -> RwLockReadGuard<'_, Slot<D>> {
        self.slot.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_slot(&self) -> RwLockWriteGuard<'_, Slot<D>> {
        self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<D: Store> Default for Registry<D> {
    fn default() -> Self {
        Registry::new()
    }
}

impl<D: Store> fmt::Debug for Registry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("store", &D::NAME)
            .field("state", &self.state())
            .finish()
    }
}

/// Marks construction in progress; cleared on drop, including when the
/// constructing future is cancelled.
struct InitFlag<'a>(&'a AtomicBool);

impl<'a> InitFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        InitFlag(flag)
    }
}

impl Drop for InitFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use pantry_core::ConflictPolicy;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Counts constructions and shutdowns through fields on the instance.
    struct SlowStore {
        shutdowns: AtomicUsize,
        closed: AtomicBool,
    }

    #[async_trait]
    impl Store for SlowStore {
        const NAME: &'static str = "slow";

        async fn open(_config: DbConfig) -> DbResult<Self> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(SlowStore {
                shutdowns: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
            })
        }

        async fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            self.closed.store(true, Ordering::SeqCst);
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    #[derive(Debug)]
    struct BrokenStore;

    #[async_trait]
    impl Store for BrokenStore {
        const NAME: &'static str = "broken";

        async fn open(_config: DbConfig) -> DbResult<Self> {
            Err(DbError::StorageInit("schema mismatch".to_string()))
        }

        async fn shutdown(&self) {}

        fn is_closed(&self) -> bool {
            false
        }
    }

    fn config() -> DbConfig {
        DbConfig::in_memory(ConflictPolicy::Reject)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_instance() {
        let registry: Arc<Registry<SlowStore>> = Arc::new(Registry::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.get_or_open(config()).await.unwrap() })
            })
            .collect();

        let mut instances = Vec::new();
        for handle in handles {
            instances.push(handle.await.unwrap());
        }

        let first = &instances[0];
        assert!(instances.iter().all(|db| Arc::ptr_eq(db, first)));
        assert_eq!(registry.state(), RegistryState::Ready);
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let registry: Arc<Registry<SlowStore>> = Arc::new(Registry::new());
        assert_eq!(registry.state(), RegistryState::Uninitialized);
        assert!(registry.get().is_none());

        let opening = {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move { registry.get_or_open(config()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(registry.state(), RegistryState::Initializing);

        let db = opening.await.unwrap().unwrap();
        assert_eq!(registry.state(), RegistryState::Ready);

        registry.close().await;
        assert_eq!(registry.state(), RegistryState::Closed);
        assert_eq!(db.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let registry: Registry<SlowStore> = Registry::new();

        // Nothing to close yet
        registry.close().await;
        assert_eq!(registry.state(), RegistryState::Uninitialized);

        let db = registry.get_or_open(config()).await.unwrap();
        registry.close().await;
        registry.close().await;

        assert_eq!(db.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(registry.state(), RegistryState::Closed);
    }

    #[tokio::test]
    async fn test_reopen_after_close_builds_new_instance() {
        let registry: Registry<SlowStore> = Registry::new();

        let first = registry.get_or_open(config()).await.unwrap();
        registry.close().await;
        let second = registry.get_or_open(config()).await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(registry.state(), RegistryState::Ready);
    }

    #[tokio::test]
    async fn test_construction_failure_is_reported_and_not_cached() {
        let registry: Registry<BrokenStore> = Registry::new();

        let err = registry.get_or_open(config()).await.unwrap_err();
        assert!(matches!(err, DbError::StorageInit(_)));
        assert_eq!(registry.state(), RegistryState::Uninitialized);
        assert!(registry.get().is_none());
    }

    #[tokio::test]
    async fn test_instance_closed_outside_registry_is_replaced() {
        let registry: Registry<SlowStore> = Registry::new();

        let first = registry.get_or_open(config()).await.unwrap();
        first.shutdown().await;

        assert_eq!(registry.state(), RegistryState::Closed);
        assert!(registry.get().is_none());

        let second = registry.get_or_open(config()).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(!second.is_closed());
        assert_eq!(registry.state(), RegistryState::Ready);

        // Closing through the registry still tears down the replacement only
        registry.close().await;
        assert_eq!(first.shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(second.shutdowns.load(Ordering::SeqCst), 1);
    }
}
