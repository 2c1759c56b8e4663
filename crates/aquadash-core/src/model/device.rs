use url::Url;

/// Separator between URL and field name in an individual-mode cache key.
const KEY_FIELD_SEPARATOR: &str = "::";

/// A single device endpoint, optionally narrowed to one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceRequest {
    pub url: Url,
    pub field: Option<String>,
}

impl DeviceRequest {
    pub fn new(url: Url, field: Option<String>) -> Self {
        Self { url, field }
    }

    /// `url`, or `url::field` when a field is named.
    pub fn cache_key(&self) -> String {
        match &self.field {
            Some(field) => format!("{}{KEY_FIELD_SEPARATOR}{field}", self.url),
            None => self.url.to_string(),
        }
    }
}
