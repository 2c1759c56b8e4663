// ── Refresh scheduler ──
//
// One recurring timer per live entry at the period of the current mode,
// and the mode-change protocol that rebuilds every timer.

use std::sync::Arc;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::{CacheEntry, Fetcher, PollCache};

/// When a freshly installed timer first fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerStart {
    /// Fire now: the entry has never been fetched.
    Immediate,
    /// Fire one period from now: the entry was just refreshed.
    AfterPeriod,
}

impl<F: Fetcher> PollCache<F> {
    /// Install a timer for `entry` at the current period, replacing any
    /// existing one. No-op if the entry has already been removed.
    pub(crate) fn start_timer(&self, entry: &Arc<CacheEntry<F>>, start: TimerStart) {
        let token = self.inner.cancel.child_token();
        if !entry.install_timer(token.clone()) {
            trace!(cache = self.inner.name, key = %entry.key, "entry removed; timer not started");
            return;
        }
        tokio::spawn(run_timer(self.clone(), Arc::clone(entry), start, token));
    }

    /// Mode-change protocol: stop every timer, force an immediate refresh
    /// of each subscribed entry, and restart its timer once that refresh
    /// completes, provided the entry still has subscribers by then.
    pub(crate) fn reschedule(&self) {
        let entries: Vec<Arc<CacheEntry<F>>> = self
            .inner
            .registry
            .iter()
            .map(|r| Arc::clone(r.value()))
            .collect();

        info!(
            cache = self.inner.name,
            mode = %self.mode(),
            period = ?self.period(),
            entries = entries.len(),
            "refresh mode changed; rescheduling"
        );

        for entry in entries {
            entry.stop_timer();
            if entry.subscribers() == 0 {
                continue;
            }
            entry.reset_last_fetched();

            let cache = self.clone();
            tokio::spawn(async move {
                let _ = cache.refresh_entry(&entry).await;
                if entry.subscribers() > 0 {
                    cache.start_timer(&entry, TimerStart::AfterPeriod);
                } else {
                    debug!(key = %entry.key, "no subscribers left after forced refresh");
                }
            });
        }
    }
}

async fn run_timer<F: Fetcher>(
    cache: PollCache<F>,
    entry: Arc<CacheEntry<F>>,
    start: TimerStart,
    cancel: CancellationToken,
) {
    // The period is fixed for the life of this timer; a mode change
    // replaces the timer rather than retuning it.
    let period = cache.period();
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    if start == TimerStart::AfterPeriod {
        interval.tick().await; // consume the immediate first tick
    }

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if entry.refresh_due(cache.mode().is_real_time(), period) {
                    let _ = cache.refresh_entry(&entry).await;
                } else {
                    trace!(key = %entry.key, "refresh not due; skipping tick");
                }
            }
        }
    }
    trace!(key = %entry.key, "timer stopped");
}
