use futures_util::future::try_join_all;
use tracing::trace;

use aquadash_api::RtdbClient;

use crate::change;
use crate::error::CoreError;
use crate::model::{Reading, SiteGroups};
use crate::store::Fetcher;

/// Aggregated mode: one document per distinct URL in a site's group set,
/// fetched concurrently and merged into a single reading.
#[derive(Debug, Clone)]
pub struct SiteFeed {
    client: RtdbClient,
}

impl SiteFeed {
    pub fn new(client: RtdbClient) -> Self {
        Self { client }
    }
}

impl Fetcher for SiteFeed {
    type Request = SiteGroups;
    type Value = Reading;

    fn cache_key(&self, request: &SiteGroups) -> String {
        request.cache_key()
    }

    async fn fetch(&self, request: &SiteGroups) -> Result<Reading, CoreError> {
        let parts = try_join_all(
            request
                .groups()
                .iter()
                .map(|group| self.client.get_fields(&group.url, &group.fields)),
        )
        .await?;

        let mut merged = Reading::new();
        for part in parts {
            merged.extend(part);
        }
        trace!(groups = request.groups().len(), fields = merged.len(), "site reading merged");
        Ok(merged)
    }

    fn has_changed(&self, old: &Reading, new: &Reading) -> bool {
        change::has_changed(old, new)
    }
}
