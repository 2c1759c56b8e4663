//! Configuration for the aquadash CLI.
//!
//! TOML sites (groups, devices, controls), polling cadence, and
//! translation to `aquadash_core::EngineConfig`. `Config` is also the
//! `SiteCatalog` the dashboard resolves sites through.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use aquadash_core::{EngineConfig, PollIntervals, SiteCatalog, UrlGroup};

/// Prefix for environment overrides, e.g. `AQUADASH_POLLING__NORMAL_SECS`.
pub const ENV_PREFIX: &str = "AQUADASH_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("unknown site '{site}'")]
    UnknownSite { site: String },

    #[error("site '{site}' has no {kind} named '{name}'")]
    UnknownItem {
        site: String,
        kind: &'static str,
        name: String,
    },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub polling: Polling,

    /// Sites keyed by identifier (e.g. "LB").
    #[serde(default)]
    pub sites: BTreeMap<String, Site>,
}

/// Polling cadence and timeout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Polling {
    #[serde(default = "default_normal_secs")]
    pub normal_secs: u64,

    #[serde(default = "default_real_time_secs")]
    pub real_time_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Start in real-time mode.
    #[serde(default)]
    pub real_time: bool,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            normal_secs: default_normal_secs(),
            real_time_secs: default_real_time_secs(),
            timeout_secs: default_timeout_secs(),
            real_time: false,
        }
    }
}

fn default_normal_secs() -> u64 {
    60
}
fn default_real_time_secs() -> u64 {
    5
}
fn default_timeout_secs() -> u64 {
    10
}

/// One monitored site: the documents polled in aggregate, the devices a
/// dashboard can watch individually, and its binary controls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Site {
    /// Human-readable name. Falls back to the identifier.
    pub name: Option<String>,

    #[serde(default)]
    pub groups: Vec<Group>,

    #[serde(default)]
    pub devices: Vec<Device>,

    #[serde(default)]
    pub controls: Vec<Control>,
}

/// A document URL and the fields read from it in aggregated polls.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Group {
    pub url: String,
    pub fields: Vec<String>,
}

/// A device polled on its own.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Device {
    pub name: String,
    pub url: String,

    /// Field copied into `value`; the whole document when absent.
    pub field: Option<String>,

    #[serde(default)]
    pub display: DisplayType,
}

/// How a device reading is rendered.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Deserialize, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    Tank,
    Pump,
    Well,
    Valve,
    Pressure,
    Flow,
    #[default]
    Status,
}

/// A binary control point (on = `1`, off = `0`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Control {
    pub name: String,
    pub url: String,
}

// ── Lookups ─────────────────────────────────────────────────────────

impl Config {
    pub fn site(&self, id: &str) -> Result<&Site, ConfigError> {
        self.sites.get(id).ok_or_else(|| ConfigError::UnknownSite {
            site: id.to_owned(),
        })
    }

    /// Engine settings derived from `[polling]`.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            intervals: PollIntervals {
                normal: Duration::from_secs(self.polling.normal_secs),
                real_time: Duration::from_secs(self.polling.real_time_secs),
            },
            timeout: Duration::from_secs(self.polling.timeout_secs),
            start_real_time: self.polling.real_time,
        }
    }

    /// Check everything the engine will rely on at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.polling;
        if p.normal_secs == 0 {
            return Err(invalid("polling.normal_secs", "must be greater than zero"));
        }
        if p.real_time_secs == 0 {
            return Err(invalid("polling.real_time_secs", "must be greater than zero"));
        }
        if p.real_time_secs >= p.normal_secs {
            return Err(invalid(
                "polling.real_time_secs",
                format!(
                    "real-time cadence ({}s) must be faster than normal ({}s)",
                    p.real_time_secs, p.normal_secs
                ),
            ));
        }
        if p.timeout_secs == 0 {
            return Err(invalid("polling.timeout_secs", "must be greater than zero"));
        }

        for (id, site) in &self.sites {
            site.validate(id)?;
        }
        Ok(())
    }
}

impl Site {
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(id)
    }

    pub fn device(&self, site: &str, name: &str) -> Result<&Device, ConfigError> {
        self.devices
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| ConfigError::UnknownItem {
                site: site.to_owned(),
                kind: "device",
                name: name.to_owned(),
            })
    }

    pub fn control(&self, site: &str, name: &str) -> Result<&Control, ConfigError> {
        self.controls
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ConfigError::UnknownItem {
                site: site.to_owned(),
                kind: "control",
                name: name.to_owned(),
            })
    }

    /// Parsed groups for the aggregated feed. Unparseable URLs are skipped;
    /// `validate()` reports them up front.
    pub fn url_groups(&self) -> Vec<UrlGroup> {
        self.groups
            .iter()
            .filter_map(|g| match Url::parse(&g.url) {
                Ok(url) => Some(UrlGroup::new(url, g.fields.iter().cloned())),
                Err(e) => {
                    warn!(url = %g.url, error = %e, "skipping group with invalid URL");
                    None
                }
            })
            .collect()
    }

    fn validate(&self, id: &str) -> Result<(), ConfigError> {
        for (i, group) in self.groups.iter().enumerate() {
            let field = format!("sites.{id}.groups[{i}]");
            parse_url(&field, &group.url)?;
            if group.fields.is_empty() {
                return Err(invalid(field, "needs at least one field"));
            }
        }
        for device in &self.devices {
            parse_url(&format!("sites.{id}.devices.{}", device.name), &device.url)?;
        }
        for control in &self.controls {
            parse_url(&format!("sites.{id}.controls.{}", control.name), &control.url)?;
        }
        Ok(())
    }
}

impl Device {
    pub fn url(&self) -> Result<Url, ConfigError> {
        parse_url(&self.name, &self.url)
    }
}

impl Control {
    pub fn url(&self) -> Result<Url, ConfigError> {
        parse_url(&self.name, &self.url)
    }
}

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| invalid(field, format!("invalid URL '{raw}': {e}")))
}

impl SiteCatalog for Config {
    fn site_groups(&self, site: &str) -> Option<Vec<UrlGroup>> {
        self.sites.get(site).map(Site::url_groups)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "aquadash", "aquadash").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("aquadash");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Layered sources: defaults, then the TOML file at `path`, then
/// `AQUADASH_*` environment variables (`__` separates nesting levels).
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load and validate the config at `path`, or at [`config_path()`].
///
/// A missing file is not an error: defaults and environment still apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    debug!(path = %path.display(), exists = path.exists(), "loading config");

    let config: Config = figment(&path).extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
