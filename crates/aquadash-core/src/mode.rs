// ── Process-wide refresh mode ──
//
// One flag shared by every cache: normal cadence with change gating, or
// fast cadence with unconditional notification.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::watch;

/// Polling mode shared by every cache entry in the process.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum RefreshMode {
    /// Slow cadence; subscribers hear only about real changes.
    #[default]
    Normal,
    /// Fast cadence; every successful poll notifies.
    RealTime,
}

impl RefreshMode {
    pub fn from_real_time(enabled: bool) -> Self {
        if enabled { Self::RealTime } else { Self::Normal }
    }

    pub fn is_real_time(self) -> bool {
        self == Self::RealTime
    }
}

/// Shared handle onto the process-wide [`RefreshMode`].
///
/// Cheaply cloneable; every cache built for one `Dashboard` holds a clone
/// of the same switch.
#[derive(Debug, Clone)]
pub struct ModeSwitch {
    tx: Arc<watch::Sender<RefreshMode>>,
}

impl Default for ModeSwitch {
    fn default() -> Self {
        Self::new(RefreshMode::Normal)
    }
}

impl ModeSwitch {
    pub fn new(initial: RefreshMode) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// The mode right now.
    pub fn current(&self) -> RefreshMode {
        *self.tx.borrow()
    }

    /// Observe mode flips.
    pub fn subscribe(&self) -> watch::Receiver<RefreshMode> {
        self.tx.subscribe()
    }

    /// Store `mode`. Returns `false` (and notifies nobody) when unchanged.
    ///
    /// Crate-private: flipping the flag without rescheduling timers would
    /// leave them at the old cadence. Go through `PollCache::set_mode` or
    /// `Dashboard::set_real_time`.
    pub(crate) fn set(&self, mode: RefreshMode) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == mode {
                false
            } else {
                *current = mode;
                true
            }
        })
    }
}
