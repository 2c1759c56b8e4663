//! Async client for the realtime JSON database that backs the aquadash
//! field-device dashboard.
//!
//! The upstream is treated as an opaque REST document store: every device
//! or device group lives at a `*.json` URL whose body is a JSON object of
//! field name → reading. This crate provides:
//!
//! - **[`RtdbClient`]**: the polling primitive. Issues cache-busted,
//!   no-store `GET`s and shapes the result for the two polling modes:
//!   [`get_fields()`](RtdbClient::get_fields) for aggregated group polls and
//!   [`get_device()`](RtdbClient::get_device) for single-device polls.
//!   [`put_value()`](RtdbClient::put_value) writes a control value.
//!
//! - **[`TransportConfig`]**: timeout and user-agent settings shared by
//!   every request, so aggregated and individual polls are bounded the
//!   same way.
//!
//! - **[`Error`]**: transport, status, and payload failures. No retry is
//!   attempted here; callers poll again on their own schedule.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{CACHE_BUST_PARAM, RtdbClient, VALUE_FIELD};
pub use error::Error;
pub use transport::TransportConfig;

/// A JSON object of field name → reading, as returned by the database.
pub type Document = serde_json::Map<String, serde_json::Value>;
