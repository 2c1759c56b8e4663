// ── Cache entry ──
//
// Last known value, fetch metadata, in-flight operation, subscriber count,
// and timer slot for one logical data source.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use futures_util::future::{BoxFuture, Shared};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{Fetcher, lock};
use crate::error::CoreError;
use crate::model::Snapshot;

/// Resolved outcome of one refresh, shared by everyone who awaited it.
pub type RefreshResult<V> = Result<Arc<V>, CoreError>;

pub(crate) type InFlight<V> = Shared<BoxFuture<'static, RefreshResult<V>>>;

/// The single recurring timer an entry may own.
pub(crate) enum TimerSlot {
    Idle,
    Running(CancellationToken),
    /// The entry left the registry; no timer may be installed again.
    Disposed,
}

pub(crate) struct CacheEntry<F: Fetcher> {
    pub(crate) key: String,
    pub(crate) request: F::Request,
    /// Current snapshot; subscribers hold receivers.
    state: watch::Sender<Snapshot<F::Value>>,
    /// Mutated only while the registry shard for `key` is locked.
    subscribers: AtomicUsize,
    /// Issue instant of the last completed fetch. `None` means "never".
    last_fetched_at: Mutex<Option<Instant>>,
    pub(crate) in_flight: Mutex<Option<InFlight<F::Value>>>,
    timer: Mutex<TimerSlot>,
}

impl<F: Fetcher> CacheEntry<F> {
    pub(crate) fn new(key: String, request: F::Request) -> Self {
        let (state, _) = watch::channel(Snapshot::default());
        Self {
            key,
            request,
            state,
            subscribers: AtomicUsize::new(0),
            last_fetched_at: Mutex::new(None),
            in_flight: Mutex::new(None),
            timer: Mutex::new(TimerSlot::Idle),
        }
    }

    // ── Subscribers ──────────────────────────────────────────────────

    pub(crate) fn subscribers(&self) -> usize {
        self.subscribers.load(Ordering::Acquire)
    }

    pub(crate) fn add_subscriber(&self) -> usize {
        self.subscribers.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Returns the count left after removing one subscriber.
    pub(crate) fn remove_subscriber(&self) -> usize {
        let prev = self
            .subscribers
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                Some(n.saturating_sub(1))
            })
            .unwrap_or(0);
        prev.saturating_sub(1)
    }

    pub(crate) fn watch(&self) -> watch::Receiver<Snapshot<F::Value>> {
        self.state.subscribe()
    }

    pub(crate) fn snapshot(&self) -> Snapshot<F::Value> {
        self.state.borrow().clone()
    }

    // ── Refresh bookkeeping ──────────────────────────────────────────

    /// Whether a timer tick should fetch.
    ///
    /// In normal mode a tick is skipped when the entry already holds a
    /// value fetched less than `period` ago.
    pub(crate) fn refresh_due(&self, real_time: bool, period: Duration) -> bool {
        if real_time || self.state.borrow().data.is_none() {
            return true;
        }
        lock(&self.last_fetched_at).is_none_or(|at| at.elapsed() >= period)
    }

    /// Forget the last fetch time so the next refresh is unconditional.
    pub(crate) fn reset_last_fetched(&self) {
        *lock(&self.last_fetched_at) = None;
    }

    /// Mark a fetch as started without waking subscribers.
    pub(crate) fn begin_loading(&self) {
        self.state.send_if_modified(|snap| {
            snap.loading = true;
            false
        });
    }

    /// Apply a finished fetch, notifying subscribers when it is accepted.
    ///
    /// Successes are accepted when `real_time` is set, when there was no
    /// value or a standing error, or when the fetcher reports a change.
    /// Failures keep the previous value, set `error`, and always notify.
    pub(crate) fn apply(
        &self,
        result: Result<F::Value, CoreError>,
        started: Instant,
        real_time: bool,
        fetcher: &F,
    ) -> RefreshResult<F::Value> {
        if self.is_disposed() {
            debug!(key = %self.key, "entry removed during fetch; discarding result");
            return result.map(Arc::new);
        }

        *lock(&self.last_fetched_at) = Some(started);

        match result {
            Ok(value) => {
                let value = Arc::new(value);
                let notified = self.state.send_if_modified(|snap| {
                    snap.loading = false;
                    let accepted = real_time
                        || snap.error.is_some()
                        || snap
                            .data
                            .as_deref()
                            .is_none_or(|old| fetcher.has_changed(old, &value));
                    if accepted {
                        snap.data = Some(Arc::clone(&value));
                        snap.error = None;
                        snap.revision += 1;
                    }
                    accepted
                });
                if notified {
                    trace!(key = %self.key, "update accepted");
                } else {
                    trace!(key = %self.key, "unchanged; subscribers not notified");
                }
                Ok(value)
            }
            Err(err) => {
                debug!(key = %self.key, error = %err, "fetch failed");
                self.state.send_modify(|snap| {
                    snap.loading = false;
                    snap.error = Some(err.clone());
                    snap.revision += 1;
                });
                Err(err)
            }
        }
    }

    // ── Timer slot ───────────────────────────────────────────────────

    /// Install `token` as the entry's timer, cancelling any previous one.
    /// Returns `false` if the entry is disposed.
    pub(crate) fn install_timer(&self, token: CancellationToken) -> bool {
        let mut slot = lock(&self.timer);
        match &*slot {
            TimerSlot::Disposed => return false,
            TimerSlot::Running(old) => old.cancel(),
            TimerSlot::Idle => {}
        }
        *slot = TimerSlot::Running(token);
        true
    }

    pub(crate) fn stop_timer(&self) {
        let mut slot = lock(&self.timer);
        if let TimerSlot::Running(token) = &*slot {
            token.cancel();
            *slot = TimerSlot::Idle;
        }
    }

    pub(crate) fn has_timer(&self) -> bool {
        matches!(*lock(&self.timer), TimerSlot::Running(_))
    }

    pub(crate) fn is_disposed(&self) -> bool {
        matches!(*lock(&self.timer), TimerSlot::Disposed)
    }

    /// Cancel the timer for good. Pending fetches still resolve, but
    /// their results are discarded.
    pub(crate) fn dispose(&self) {
        let mut slot = lock(&self.timer);
        if let TimerSlot::Running(token) = std::mem::replace(&mut *slot, TimerSlot::Disposed) {
            token.cancel();
        }
    }
}
