// ── Reading feeds ──
//
// The two `Fetcher`s the dashboard is built from. Both poll the realtime
// database through one shared `RtdbClient` and gate notifications with
// the structural change detector.

mod device;
mod site;

pub use device::DeviceFeed;
pub use site::SiteFeed;
