// ── Site catalog ──
//
// The static site → group mapping lives outside the engine. The core
// consumes it only as already-resolved groups.

use std::collections::HashMap;

use crate::model::UrlGroup;

/// Resolves a site identifier to the URL groups polled for it.
pub trait SiteCatalog: Send + Sync {
    /// Groups for `site`, or `None` if the site is unknown.
    fn site_groups(&self, site: &str) -> Option<Vec<UrlGroup>>;
}

impl SiteCatalog for HashMap<String, Vec<UrlGroup>> {
    fn site_groups(&self, site: &str) -> Option<Vec<UrlGroup>> {
        self.get(site).cloned()
    }
}
