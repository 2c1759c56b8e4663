//! Shared polling, caching, and subscription engine for the aquadash
//! field-device dashboard.
//!
//! Many widgets watch the same handful of realtime-database documents.
//! This crate makes sure each document is polled once, on one timer, no
//! matter how many consumers are interested:
//!
//! - **[`Dashboard`]**: Composition root. Owns the shared HTTP client,
//!   the process-wide [`RefreshMode`], and one [`PollCache`] per feed.
//!   [`set_real_time()`](Dashboard::set_real_time) flips every timer
//!   between the normal and fast cadence at once.
//!
//! - **[`PollCache`]**: Generic registry of key → cache entry, built on
//!   `DashMap` + `tokio::sync::watch`. Entries are created on the first
//!   subscription and destroyed on the last; each owns exactly one timer
//!   and at most one in-flight fetch. Parameterized by a [`Fetcher`].
//!
//! - **[`Subscription`]**: Handle vended by a cache. Exposes
//!   `snapshot()` / `changed()` / `listen()` / `into_stream()`;
//!   dropping it unsubscribes.
//!
//! - **Feeds** ([`feed`]): [`SiteFeed`] (aggregated groups of fields
//!   from several documents) and [`DeviceFeed`] (one device, one field
//!   normalized into `value`).
//!
//! - **[`change`]**: Structural change detection gating notifications
//!   in normal mode.

pub mod catalog;
pub mod change;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod mode;
pub mod model;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use catalog::SiteCatalog;
pub use config::{EngineConfig, PollIntervals};
pub use dashboard::{Dashboard, DeviceSubscription, SiteSubscription};
pub use error::CoreError;
pub use feed::{DeviceFeed, SiteFeed};
pub use mode::{ModeSwitch, RefreshMode};
pub use model::{DeviceRequest, EntryStatus, Reading, SiteGroups, Snapshot, UrlGroup};
pub use store::{Fetcher, PollCache, RefreshResult};
pub use stream::{Listener, SnapshotStream, Subscription};
