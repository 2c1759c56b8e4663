use aquadash_api::RtdbClient;

use crate::change;
use crate::error::CoreError;
use crate::model::{DeviceRequest, Reading};
use crate::store::Fetcher;

/// Individual mode: one device document, with the requested field copied
/// into the conventional `value` attribute rendering code reads.
#[derive(Debug, Clone)]
pub struct DeviceFeed {
    client: RtdbClient,
}

impl DeviceFeed {
    pub fn new(client: RtdbClient) -> Self {
        Self { client }
    }

    /// Poll a device once, outside any cache entry.
    pub async fn fetch_once(&self, request: &DeviceRequest) -> Result<Reading, CoreError> {
        Ok(self
            .client
            .get_device(&request.url, request.field.as_deref())
            .await?)
    }
}

impl Fetcher for DeviceFeed {
    type Request = DeviceRequest;
    type Value = Reading;

    fn cache_key(&self, request: &DeviceRequest) -> String {
        request.cache_key()
    }

    async fn fetch(&self, request: &DeviceRequest) -> Result<Reading, CoreError> {
        self.fetch_once(request).await
    }

    fn has_changed(&self, old: &Reading, new: &Reading) -> bool {
        change::has_changed(old, new)
    }
}
