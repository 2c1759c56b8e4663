// Realtime database HTTP client
//
// Wraps `reqwest::Client` with cache-busting, status checking, and the
// two result shapes the dashboard polls for. Every call is a single
// request: failures are returned, never retried.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::Document;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Query parameter appended to every GET to defeat intermediate caches.
pub const CACHE_BUST_PARAM: &str = "t";

/// Attribute that single-device polls copy the requested field into.
pub const VALUE_FIELD: &str = "value";

/// HTTP client for the realtime database.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted,
/// so every feed can hold its own handle onto one connection pool.
#[derive(Debug, Clone)]
pub struct RtdbClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl RtdbClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            timeout: transport.timeout,
        })
    }

    /// The request timeout applied to every call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Fetch a whole document.
    ///
    /// A `null` body (the database's answer for a path with no data) is
    /// returned as an empty document. Any other non-object body is an
    /// [`Error::UnexpectedShape`].
    pub async fn get_document(&self, url: &Url) -> Result<Document, Error> {
        let request_url = cache_busted(url);
        debug!(url = %url, "GET document");

        let resp = self
            .http
            .get(request_url)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let body = self.read_body(url, resp).await?;
        match parse_json(&body)? {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Document::new()),
            other => Err(Error::UnexpectedShape {
                url: url.to_string(),
                message: format!("expected a JSON object, got {}", json_kind(&other)),
            }),
        }
    }

    /// Fetch a document and keep only the requested top-level fields.
    ///
    /// Used by aggregated polls, where one document feeds several widgets.
    /// Fields missing from the document are left out of the result.
    pub async fn get_fields(&self, url: &Url, fields: &[String]) -> Result<Document, Error> {
        let doc = self.get_document(url).await?;
        Ok(extract_fields(doc, fields))
    }

    /// Fetch a single device document, copying `field` into [`VALUE_FIELD`].
    ///
    /// The rest of the document (timestamps, status flags) is kept alongside.
    /// When `field` is given but absent, `value` is `null`.
    pub async fn get_device(&self, url: &Url, field: Option<&str>) -> Result<Document, Error> {
        let doc = self.get_document(url).await?;
        Ok(normalize_value(doc, field))
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Write `value` at `url` with a `PUT`, returning the echoed body.
    ///
    /// Used to toggle binary control points (e.g. a pump reset flag).
    pub async fn put_value(&self, url: &Url, value: &Value) -> Result<Value, Error> {
        debug!(url = %url, %value, "PUT value");

        let resp = self
            .http
            .put(url.clone())
            .json(value)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let body = self.read_body(url, resp).await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        parse_json(&body)
    }

    // ── Private helpers ──────────────────────────────────────────────

    async fn read_body(&self, url: &Url, resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = resp.text().await.map_err(|e| self.map_transport(e))?;
        trace!(url = %url, bytes = body.len(), "response body");
        Ok(body)
    }

    fn map_transport(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

/// Append the cache-busting query parameter (current Unix millis).
fn cache_busted(url: &Url) -> Url {
    let mut busted = url.clone();
    let stamp = chrono::Utc::now().timestamp_millis().to_string();
    busted
        .query_pairs_mut()
        .append_pair(CACHE_BUST_PARAM, &stamp);
    busted
}

fn parse_json(body: &str) -> Result<Value, Error> {
    serde_json::from_str(body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: body.to_owned(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn extract_fields(mut doc: Document, fields: &[String]) -> Document {
    fields
        .iter()
        .filter_map(|f| doc.remove(f).map(|v| (f.clone(), v)))
        .collect()
}

fn normalize_value(mut doc: Document, field: Option<&str>) -> Document {
    if let Some(field) = field {
        let value = doc.get(field).cloned().unwrap_or(Value::Null);
        doc.insert(VALUE_FIELD.to_owned(), value);
    }
    doc
}
