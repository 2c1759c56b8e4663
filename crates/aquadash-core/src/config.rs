// ── Runtime engine configuration ──
//
// These types describe *how often* and *how patiently* to poll. They
// never touch disk: the config crate (or a test) builds an
// `EngineConfig` and hands it in.

use std::time::Duration;

use aquadash_api::TransportConfig;

use crate::mode::RefreshMode;

/// The two polling cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    /// Cadence in normal mode (order of minutes).
    pub normal: Duration,
    /// Cadence in real-time mode (order of seconds).
    pub real_time: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            normal: Duration::from_secs(60),
            real_time: Duration::from_secs(5),
        }
    }
}

impl PollIntervals {
    /// Timer period for the given mode. Never zero.
    pub fn period(&self, mode: RefreshMode) -> Duration {
        let period = match mode {
            RefreshMode::Normal => self.normal,
            RefreshMode::RealTime => self.real_time,
        };
        period.max(Duration::from_millis(1))
    }
}

/// Configuration for the polling engine.
///
/// Built by the config crate or CLI, passed to `Dashboard`; core never
/// reads config files.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub intervals: PollIntervals,
    /// Timeout for every request, aggregated and per-device alike.
    pub timeout: Duration,
    /// Start in real-time mode instead of normal mode.
    pub start_real_time: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            intervals: PollIntervals::default(),
            timeout: Duration::from_secs(10),
            start_real_time: false,
        }
    }
}

impl EngineConfig {
    /// Transport settings for the shared HTTP client.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig::with_timeout(self.timeout)
    }

    /// Mode the engine starts in.
    pub fn initial_mode(&self) -> RefreshMode {
        RefreshMode::from_real_time(self.start_real_time)
    }
}
