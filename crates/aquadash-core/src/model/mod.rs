// ── Domain model ──
//
// Readings, request descriptors for both polling modes, and the
// snapshot view that subscribers render from.

pub mod device;
pub mod site;
pub mod snapshot;

pub use device::DeviceRequest;
pub use site::{SiteGroups, UrlGroup};
pub use snapshot::{EntryStatus, Snapshot};

/// One polled value: field name → JSON reading.
pub type Reading = aquadash_api::Document;
