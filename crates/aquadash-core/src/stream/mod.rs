// ── Subscription handles ──
//
// What consumers hold while they are interested in a cache entry. Each
// handle counts as one subscriber; dropping it unsubscribes.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::WaitForCancellationFutureOwned;

use crate::model::Snapshot;
use crate::store::{CacheEntry, Fetcher, PollCache};

/// Holds one subscriber slot on an entry and gives it back on drop.
struct SubscriptionGuard<F: Fetcher> {
    cache: PollCache<F>,
    entry: Option<Arc<CacheEntry<F>>>,
}

impl<F: Fetcher> SubscriptionGuard<F> {
    fn key(&self) -> &str {
        self.entry.as_ref().map_or("", |e| e.key.as_str())
    }
}

impl<F: Fetcher> Drop for SubscriptionGuard<F> {
    fn drop(&mut self) {
        if let Some(entry) = self.entry.take() {
            self.cache.release(&entry);
        }
    }
}

/// A live subscription to one cache entry.
///
/// Provides both point-in-time snapshot access and change notification
/// via [`changed()`](Self::changed), a callback via
/// [`listen()`](Self::listen), or a `Stream` via
/// [`into_stream()`](Self::into_stream). Notifications arrive on the
/// subscriber's own task turn, never inside the fetch that produced them.
pub struct Subscription<F: Fetcher> {
    guard: SubscriptionGuard<F>,
    receiver: watch::Receiver<Snapshot<F::Value>>,
}

impl<F: Fetcher> Subscription<F> {
    pub(crate) fn new(
        cache: PollCache<F>,
        entry: Arc<CacheEntry<F>>,
        receiver: watch::Receiver<Snapshot<F::Value>>,
    ) -> Self {
        Self {
            guard: SubscriptionGuard {
                cache,
                entry: Some(entry),
            },
            receiver,
        }
    }

    /// Cache key this subscription is attached to.
    pub fn key(&self) -> &str {
        self.guard.key()
    }

    /// The latest snapshot, without waiting.
    pub fn snapshot(&self) -> Snapshot<F::Value> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next notified update, returning the new snapshot.
    /// Returns `None` once the entry's cache is disposed, including when
    /// that happens while waiting.
    pub async fn changed(&mut self) -> Option<Snapshot<F::Value>> {
        let disposed = self.guard.cache.disposed();
        tokio::select! {
            biased;
            () = disposed.cancelled() => None,
            res = self.receiver.changed() => {
                res.ok()?;
                Some(self.receiver.borrow_and_update().clone())
            }
        }
    }

    /// Explicitly unsubscribe. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Hand notifications to `callback` on a background task.
    ///
    /// The returned [`Listener`] keeps the subscription alive. Dropping it
    /// unsubscribes immediately; updates that were already pending are
    /// skipped rather than delivered to a removed listener. The task ends
    /// when the cache is disposed.
    ///
    /// Updates accepted before the callback task gets to run are coalesced
    /// and the callback sees only the latest one, so consecutive snapshots
    /// can skip [`revision`](Snapshot::revision) numbers.
    pub fn listen<C>(self, mut callback: C) -> Listener<F>
    where
        C: FnMut(Snapshot<F::Value>) + Send + 'static,
    {
        let Self {
            guard,
            mut receiver,
        } = self;
        let disposed = guard.cache.disposed();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = disposed.cancelled() => break,
                    res = receiver.changed() => {
                        if res.is_err() {
                            break;
                        }
                        let snapshot = receiver.borrow_and_update().clone();
                        callback(snapshot);
                    }
                }
            }
        });
        Listener {
            task,
            _guard: guard,
        }
    }

    /// Convert into a `Stream` that yields the current snapshot first,
    /// then every notified update, and ends when the cache is disposed.
    pub fn into_stream(self) -> SnapshotStream<F> {
        let Self { guard, receiver } = self;
        SnapshotStream {
            inner: WatchStream::new(receiver),
            disposed: Box::pin(guard.cache.disposed().cancelled_owned()),
            _guard: guard,
        }
    }
}

/// A callback subscription created by [`Subscription::listen`].
pub struct Listener<F: Fetcher> {
    task: JoinHandle<()>,
    _guard: SubscriptionGuard<F>,
}

impl<F: Fetcher> Listener<F> {
    /// Stop listening and unsubscribe. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl<F: Fetcher> Drop for Listener<F> {
    fn drop(&mut self) {
        // The guard field drops after this, releasing the subscriber slot.
        self.task.abort();
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct SnapshotStream<F: Fetcher> {
    inner: WatchStream<Snapshot<F::Value>>,
    disposed: Pin<Box<WaitForCancellationFutureOwned>>,
    _guard: SubscriptionGuard<F>,
}

impl<F: Fetcher> Stream for SnapshotStream<F> {
    type Item = Snapshot<F::Value>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.disposed.as_mut().poll(cx).is_ready() {
            return Poll::Ready(None);
        }
        // Every field is Unpin.
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
