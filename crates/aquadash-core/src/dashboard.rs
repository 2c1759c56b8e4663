// ── Dashboard composition root ──
//
// Owns the shared HTTP client, the process-wide refresh mode, and the two
// caches (aggregated sites, individual devices). Consumers subscribe
// through it; the real-time toggle goes through it so both caches are
// rescheduled together.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info};
use url::Url;

use aquadash_api::RtdbClient;

use crate::catalog::SiteCatalog;
use crate::config::EngineConfig;
use crate::error::CoreError;
use crate::feed::{DeviceFeed, SiteFeed};
use crate::mode::{ModeSwitch, RefreshMode};
use crate::model::{DeviceRequest, Reading, SiteGroups, Snapshot};
use crate::store::PollCache;
use crate::stream::Subscription;

/// Subscription to a site's aggregated reading.
pub type SiteSubscription = Subscription<SiteFeed>;

/// Subscription to a single device reading.
pub type DeviceSubscription = Subscription<DeviceFeed>;

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<DashboardInner>`. Build one per process (or
/// per test) and [`dispose`](Self::dispose) it when done.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: EngineConfig,
    client: RtdbClient,
    catalog: Arc<dyn SiteCatalog>,
    mode: ModeSwitch,
    sites: PollCache<SiteFeed>,
    devices: PollCache<DeviceFeed>,
}

impl Dashboard {
    /// Build a dashboard with its own HTTP client.
    pub fn new(config: EngineConfig, catalog: Arc<dyn SiteCatalog>) -> Result<Self, CoreError> {
        let client = RtdbClient::new(&config.transport())?;
        Ok(Self::with_client(config, client, catalog))
    }

    /// Build a dashboard around an existing client.
    pub fn with_client(
        config: EngineConfig,
        client: RtdbClient,
        catalog: Arc<dyn SiteCatalog>,
    ) -> Self {
        let mode = ModeSwitch::new(config.initial_mode());
        let sites = PollCache::new(
            "sites",
            SiteFeed::new(client.clone()),
            config.intervals,
            mode.clone(),
        );
        let devices = PollCache::new(
            "devices",
            DeviceFeed::new(client.clone()),
            config.intervals,
            mode.clone(),
        );

        Self {
            inner: Arc::new(DashboardInner {
                config,
                client,
                catalog,
                mode,
                sites,
                devices,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// The aggregated-site cache.
    pub fn sites(&self) -> &PollCache<SiteFeed> {
        &self.inner.sites
    }

    /// The individual-device cache.
    pub fn devices(&self) -> &PollCache<DeviceFeed> {
        &self.inner.devices
    }

    // ── Consumer feeds ───────────────────────────────────────────

    /// Subscribe to the aggregated reading for `site`.
    ///
    /// Returns `None` when the catalog has no groups for the site; an
    /// unconfigured site is not an error.
    pub fn subscribe_site(&self, site: &str) -> Option<SiteSubscription> {
        let groups = self.site_groups(site)?;
        Some(self.inner.sites.subscribe(groups))
    }

    /// Subscribe to one device, optionally narrowed to `field`.
    pub fn subscribe_device(&self, url: Url, field: Option<String>) -> DeviceSubscription {
        self.inner
            .devices
            .subscribe(DeviceRequest::new(url, field))
    }

    /// Current snapshot for `site` without subscribing.
    pub fn site_snapshot(&self, site: &str) -> Snapshot<Reading> {
        self.site_groups(site)
            .map(|groups| self.inner.sites.snapshot(&groups.cache_key()))
            .unwrap_or_default()
    }

    /// Current snapshot for a device without subscribing.
    pub fn device_snapshot(&self, url: &Url, field: Option<&str>) -> Snapshot<Reading> {
        let request = DeviceRequest::new(url.clone(), field.map(ToOwned::to_owned));
        self.inner.devices.snapshot(&request.cache_key())
    }

    fn site_groups(&self, site: &str) -> Option<SiteGroups> {
        let Some(groups) = self.inner.catalog.site_groups(site) else {
            debug!(site, "no configuration for site");
            return None;
        };
        let groups = SiteGroups::new(groups);
        if groups.is_empty() {
            debug!(site, "site has no polled groups");
            return None;
        }
        Some(groups)
    }

    // ── Refresh mode ─────────────────────────────────────────────

    pub fn mode(&self) -> RefreshMode {
        self.inner.mode.current()
    }

    pub fn is_real_time(&self) -> bool {
        self.mode().is_real_time()
    }

    /// Observe mode flips (for a UI toggle indicator).
    pub fn mode_changes(&self) -> watch::Receiver<RefreshMode> {
        self.inner.mode.subscribe()
    }

    /// Enable or disable real-time mode for every cache.
    ///
    /// Returns `false` and does nothing when the mode is unchanged.
    /// Otherwise every subscribed entry is refreshed immediately and its
    /// timer restarted at the new cadence.
    pub fn set_real_time(&self, enabled: bool) -> bool {
        let mode = RefreshMode::from_real_time(enabled);
        if !self.inner.mode.set(mode) {
            return false;
        }
        info!(%mode, "switching refresh mode");
        self.inner.sites.reschedule();
        self.inner.devices.reschedule();
        true
    }

    // ── One-shot operations ──────────────────────────────────────

    /// Poll a device once, bypassing the caches.
    pub async fn poll_once(&self, url: &Url, field: Option<&str>) -> Result<Reading, CoreError> {
        let request = DeviceRequest::new(url.clone(), field.map(ToOwned::to_owned));
        self.inner.devices.fetcher().fetch_once(&request).await
    }

    /// Set a binary control point (`1` for on, `0` for off).
    pub async fn write_control(&self, url: &Url, on: bool) -> Result<Value, CoreError> {
        let value = Value::from(u8::from(on));
        info!(url = %url, %value, "writing control value");
        Ok(self.inner.client.put_value(url, &value).await?)
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Stop all polling and drop every cache entry.
    pub fn dispose(&self) {
        self.inner.sites.dispose();
        self.inner.devices.dispose();
        debug!("dashboard disposed");
    }
}
