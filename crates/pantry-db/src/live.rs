//! # Live Queries
//!
//! Reactive query streams that re-run whenever their table changes.
//!
//! ## How It Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Change Notification                                │
//! │                                                                         │
//! │  Repository mutation (insert / update / delete)                        │
//! │       │  committed, rows_affected > 0                                   │
//! │       ▼                                                                 │
//! │  ChangeNotifier::notify()   ← bumps a watch::Sender<u64> version       │
//! │       │                                                                 │
//! │       ├──────────────┬──────────────┐                                  │
//! │       ▼              ▼              ▼                                   │
//! │  LiveQuery #1   LiveQuery #2   LiveQuery #3  (each has its own         │
//! │  rx.changed()   rx.changed()   rx.changed()   watch::Receiver)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  re-run SELECT → yield full snapshot                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - A new subscription yields the current snapshot first.
//! - Each later change yields a fresh snapshot, in change order. Changes that
//!   land while a snapshot is being evaluated collapse into one follow-up
//!   snapshot; since every snapshot is the full current state nothing is lost.
//! - Dropping the [`LiveQuery`] cancels the subscription.
//! - If a re-evaluation fails (e.g. the store was closed) the error is
//!   yielded once and the stream ends.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::error::{DbError, DbResult};

// =============================================================================
// Change Notifier
// =============================================================================

/// Per-table change counter shared by a repository and its live queries.
#[derive(Debug)]
pub struct ChangeNotifier {
    table: &'static str,
    tx: watch::Sender<u64>,
}

impl ChangeNotifier {
    /// Creates a notifier for `table` at version 0.
    pub fn new(table: &'static str) -> Self {
        let (tx, _) = watch::channel(0);
        ChangeNotifier { table, tx }
    }

    /// Records one change and wakes every subscriber.
    ///
    /// Does not block; subscribers re-evaluate on their own tasks.
    pub fn notify(&self) {
        self.tx.send_modify(|version| *version = version.wrapping_add(1));
        trace!(
            table = self.table,
            version = *self.tx.borrow(),
            subscribers = self.tx.receiver_count(),
            "Table changed"
        );
    }

    /// Returns a receiver that reports "changed" once immediately, so the
    /// first poll of a live query evaluates the current snapshot.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        let mut rx = self.tx.subscribe();
        rx.mark_changed();
        rx
    }

    /// Number of changes recorded so far.
    pub fn version(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Number of live subscriptions currently attached.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Table this notifier watches.
    pub fn table(&self) -> &'static str {
        self.table
    }
}

// =============================================================================
// Live Query
// =============================================================================

/// An infinite stream of query snapshots.
///
/// ## Usage
/// ```rust,ignore
/// use futures_util::StreamExt;
///
/// let mut products = db.products().get_all();
///
/// // current snapshot
/// let now = products.first().await?;
///
/// // every later change
/// while let Some(snapshot) = products.next().await {
///     render(snapshot?);
/// }
/// ```
pub struct LiveQuery<T> {
    table: &'static str,
    inner: BoxStream<'static, DbResult<T>>,
}

impl<T: Send + 'static> LiveQuery<T> {
    /// Builds a live query that runs `query` once per change signal.
    pub(crate) fn new<F, Fut>(table: &'static str, rx: watch::Receiver<u64>, query: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = DbResult<T>> + Send + 'static,
    {
        debug!(table, "Live query subscribed");

        let inner = stream::unfold(Some((rx, query)), move |state| async move {
            let Some((mut rx, query)) = state else {
                return None;
            };

            // Sender dropped: the store is gone, end quietly
            if rx.changed().await.is_err() {
                debug!(table, "Live query source dropped");
                return None;
            }

            match query().await {
                Ok(snapshot) => Some((Ok(snapshot), Some((rx, query)))),
                Err(e) => {
                    debug!(table, error = %e, "Live query re-evaluation failed");
                    Some((Err(e), None))
                }
            }
        })
        .boxed();

        LiveQuery { table, inner }
    }

    /// Waits for the next snapshot.
    ///
    /// On a fresh subscription this is the current state of the table.
    /// Returns [`DbError::Closed`] if the stream has already ended.
    pub async fn first(&mut self) -> DbResult<T> {
        match self.inner.next().await {
            Some(snapshot) => snapshot,
            None => Err(DbError::Closed),
        }
    }

    /// Table this query watches.
    pub fn table(&self) -> &'static str {
        self.table
    }
}

impl<T> Stream for LiveQuery<T> {
    type Item = DbResult<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl<T> fmt::Debug for LiveQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveQuery")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    fn counting_query(
        notifier: &ChangeNotifier,
        counter: Arc<AtomicU64>,
    ) -> LiveQuery<u64> {
        LiveQuery::new(notifier.table(), notifier.subscribe(), move || {
            let counter = Arc::clone(&counter);
            async move { Ok(counter.load(Ordering::SeqCst)) }
        })
    }

    #[tokio::test]
    async fn test_emits_current_value_on_subscribe() {
        let notifier = ChangeNotifier::new("things");
        let value = Arc::new(AtomicU64::new(7));
        let mut query = counting_query(&notifier, value);

        assert_eq!(timeout(WAIT, query.first()).await.unwrap().unwrap(), 7);
    }

    #[tokio::test]
    async fn test_emits_again_after_notify() {
        let notifier = ChangeNotifier::new("things");
        let value = Arc::new(AtomicU64::new(1));
        let mut query = counting_query(&notifier, Arc::clone(&value));

        assert_eq!(query.first().await.unwrap(), 1);

        value.store(2, Ordering::SeqCst);
        notifier.notify();

        let next = timeout(WAIT, query.next()).await.unwrap();
        assert_eq!(next.unwrap().unwrap(), 2);
        assert_eq!(notifier.version(), 1);
    }

    #[tokio::test]
    async fn test_no_emission_without_change() {
        let notifier = ChangeNotifier::new("things");
        let mut query = counting_query(&notifier, Arc::new(AtomicU64::new(0)));

        query.first().await.unwrap();
        let pending = timeout(Duration::from_millis(50), query.next()).await;
        assert!(pending.is_err(), "no change, so no new snapshot");
    }

    #[tokio::test]
    async fn test_error_ends_stream() {
        let notifier = ChangeNotifier::new("things");
        let mut query: LiveQuery<u64> =
            LiveQuery::new("things", notifier.subscribe(), || async { Err(DbError::Closed) });

        assert!(query.first().await.unwrap_err().is_closed());
        assert!(query.next().await.is_none());
    }

    #[tokio::test]
    async fn test_ends_when_notifier_dropped() {
        let notifier = ChangeNotifier::new("things");
        let mut query = counting_query(&notifier, Arc::new(AtomicU64::new(3)));
        query.first().await.unwrap();

        drop(notifier);
        assert!(timeout(WAIT, query.next()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let notifier = ChangeNotifier::new("things");
        let query = counting_query(&notifier, Arc::new(AtomicU64::new(0)));
        assert_eq!(notifier.subscriber_count(), 1);

        drop(query);
        assert_eq!(notifier.subscriber_count(), 0);
    }
}
