// ── Polled, deduplicated, refcounted cache ──
//
// One generic engine behind both consumer feeds: a registry of
// key → cache entry, created on first subscription, destroyed on the
// last unsubscribe, refreshed by one timer per entry.

mod entry;
mod scheduler;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures_util::FutureExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

pub use entry::RefreshResult;
pub(crate) use entry::{CacheEntry, InFlight};
pub(crate) use scheduler::TimerStart;

use crate::config::PollIntervals;
use crate::error::CoreError;
use crate::mode::{ModeSwitch, RefreshMode};
use crate::model::Snapshot;
use crate::stream::Subscription;

/// How a cache obtains and compares values for one kind of data source.
///
/// The engine is generic over this trait: the aggregated site feed and the
/// individual device feed are both just `Fetcher` implementations.
pub trait Fetcher: Send + Sync + 'static {
    /// Everything needed to poll one source. Stored in its cache entry.
    type Request: Send + Sync + 'static;
    /// What one poll produces.
    type Value: Send + Sync + 'static;

    /// Identity of the source; requests with equal keys share an entry.
    fn cache_key(&self, request: &Self::Request) -> String;

    /// Poll the source once. Failures are returned, never retried.
    fn fetch(
        &self,
        request: &Self::Request,
    ) -> impl Future<Output = Result<Self::Value, CoreError>> + Send;

    /// Normal-mode gate: should `new` replace `old` and notify?
    fn has_changed(&self, old: &Self::Value, new: &Self::Value) -> bool;
}

/// A registry of polled cache entries sharing one fetcher and one
/// process-wide [`ModeSwitch`].
///
/// Cheaply cloneable via `Arc<CacheInner>`. Explicitly constructed and
/// explicitly [`dispose`](Self::dispose)d, so tests get isolated instances.
pub struct PollCache<F: Fetcher> {
    inner: Arc<CacheInner<F>>,
}

struct CacheInner<F: Fetcher> {
    /// Label for logs ("sites", "devices").
    name: &'static str,
    fetcher: Arc<F>,
    registry: DashMap<String, Arc<CacheEntry<F>>>,
    mode: ModeSwitch,
    intervals: PollIntervals,
    /// Parent of every entry timer.
    cancel: CancellationToken,
}

impl<F: Fetcher> Clone for PollCache<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: Fetcher> PollCache<F> {
    pub fn new(name: &'static str, fetcher: F, intervals: PollIntervals, mode: ModeSwitch) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                name,
                fetcher: Arc::new(fetcher),
                registry: DashMap::new(),
                mode,
                intervals,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.inner.fetcher
    }

    pub fn mode(&self) -> RefreshMode {
        self.inner.mode.current()
    }

    /// Timer period for the current mode.
    pub fn period(&self) -> std::time::Duration {
        self.inner.intervals.period(self.mode())
    }

    // ── Subscription management ──────────────────────────────────────

    /// Subscribe to the entry for `request`, creating it (and starting its
    /// timer, which polls immediately) if this is the first subscriber.
    ///
    /// The returned handle unsubscribes when dropped. After
    /// [`dispose`](Self::dispose) the handle is already closed: it stays
    /// empty, registers nothing, and `changed()` returns `None`.
    pub fn subscribe(&self, request: F::Request) -> Subscription<F> {
        let key = self.inner.fetcher.cache_key(&request);

        if self.is_disposed() {
            debug!(cache = self.inner.name, key = %key, "cache disposed; subscription closed");
            let entry = Arc::new(CacheEntry::new(key, request));
            entry.dispose();
            let receiver = entry.watch();
            return Subscription::new(self.clone(), entry, receiver);
        }

        // Count and insert under the shard lock so racing subscribers
        // converge on one entry.
        let (entry, created) = match self.inner.registry.entry(key) {
            Entry::Occupied(occupied) => {
                let entry = Arc::clone(occupied.get());
                let count = entry.add_subscriber();
                trace!(cache = self.inner.name, key = %entry.key, count, "subscriber added");
                (entry, false)
            }
            Entry::Vacant(vacant) => {
                let entry = Arc::new(CacheEntry::new(vacant.key().clone(), request));
                entry.add_subscriber();
                vacant.insert(Arc::clone(&entry));
                (entry, true)
            }
        };

        if created {
            debug!(cache = self.inner.name, key = %entry.key, "cache entry created");
            self.start_timer(&entry, TimerStart::Immediate);
        }

        let receiver = entry.watch();
        Subscription::new(self.clone(), entry, receiver)
    }

    /// Drop one subscriber from `entry`; the last one removes the entry
    /// and clears its timer before returning.
    pub(crate) fn release(&self, entry: &Arc<CacheEntry<F>>) {
        let removed = match self.inner.registry.entry(entry.key.clone()) {
            Entry::Occupied(occupied) if Arc::ptr_eq(occupied.get(), entry) => {
                let left = entry.remove_subscriber();
                trace!(cache = self.inner.name, key = %entry.key, left, "subscriber removed");
                if left == 0 {
                    occupied.remove();
                    true
                } else {
                    false
                }
            }
            // Already gone (cache disposed); nothing to count down.
            _ => false,
        };

        if removed {
            entry.dispose();
            debug!(cache = self.inner.name, key = %entry.key, "cache entry removed");
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Current `{ data, loading, error }` view of `key`, with no side
    /// effects. An unknown key yields an empty snapshot.
    pub fn snapshot(&self, key: &str) -> Snapshot<F::Value> {
        self.inner
            .registry
            .get(key)
            .map(|entry| entry.snapshot())
            .unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.registry.contains_key(key)
    }

    /// Subscriber count for `key` (0 when no entry exists).
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.inner
            .registry
            .get(key)
            .map_or(0, |entry| entry.subscribers())
    }

    /// Whether `key` has a live refresh timer.
    pub fn has_timer(&self, key: &str) -> bool {
        self.inner
            .registry
            .get(key)
            .is_some_and(|entry| entry.has_timer())
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.registry.is_empty()
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Refresh `key` now, attaching to a fetch already in flight if there
    /// is one. Returns `None` when no entry exists for `key`.
    pub async fn refresh(&self, key: &str) -> Option<RefreshResult<F::Value>> {
        let entry = self.inner.registry.get(key).map(|r| Arc::clone(r.value()))?;
        Some(self.refresh_entry(&entry).await)
    }

    /// Start (or join) the single in-flight fetch for `entry`.
    ///
    /// The fetch runs on its own task, so it completes even if every
    /// caller stops waiting; its result is then applied (or discarded if
    /// the entry was removed meanwhile).
    pub(crate) fn refresh_entry(&self, entry: &Arc<CacheEntry<F>>) -> InFlight<F::Value> {
        let mut slot = lock(&entry.in_flight);
        if let Some(pending) = slot.as_ref() {
            trace!(cache = self.inner.name, key = %entry.key, "joining in-flight fetch");
            return pending.clone();
        }

        entry.begin_loading();

        let fetcher = Arc::clone(&self.inner.fetcher);
        let mode = self.inner.mode.clone();
        let task_entry = Arc::clone(entry);
        let fetch = async move {
            let started = Instant::now();
            let result = fetcher.fetch(&task_entry.request).await;
            let real_time = mode.current().is_real_time();
            let outcome = task_entry.apply(result, started, real_time, &fetcher);
            lock(&task_entry.in_flight).take();
            outcome
        }
        .boxed()
        .shared();

        *slot = Some(fetch.clone());
        drop(slot);

        tokio::spawn(fetch.clone());
        fetch
    }

    // ── Mode ─────────────────────────────────────────────────────────

    /// Switch the shared mode and reschedule this cache's timers.
    ///
    /// Returns `false` without touching any timer when `mode` is already
    /// current. Caches sharing the switch must be rescheduled by the
    /// caller (see `Dashboard::set_real_time`).
    pub fn set_mode(&self, mode: RefreshMode) -> bool {
        if !self.inner.mode.set(mode) {
            return false;
        }
        self.reschedule();
        true
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Stop every timer and drop every entry. Outstanding subscriptions
    /// keep their last snapshot but receive no further updates.
    pub fn dispose(&self) {
        self.inner.cancel.cancel();
        let entries: Vec<Arc<CacheEntry<F>>> = self
            .inner
            .registry
            .iter()
            .map(|r| Arc::clone(r.value()))
            .collect();
        self.inner.registry.clear();
        for entry in &entries {
            entry.dispose();
        }
        debug!(cache = self.inner.name, entries = entries.len(), "cache disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Fires when the cache is disposed.
    pub(crate) fn disposed(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }
}

/// Lock a std mutex, recovering the data if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
