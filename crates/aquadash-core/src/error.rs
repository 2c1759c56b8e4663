// ── Core error types ──
//
// User-facing errors from aquadash-core. These are NOT API-specific:
// consumers never see reqwest errors or raw bodies directly. The
// `From<aquadash_api::Error>` impl translates transport-layer errors into
// domain-appropriate variants. Every variant holds plain strings so an
// error can be stored in a cache entry and handed to each subscriber.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach data source at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Data source timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Data source returned HTTP {status} for {url}")]
    Http { status: u16, url: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Invalid payload: {message}")]
    InvalidPayload { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` if polling again later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<aquadash_api::Error> for CoreError {
    fn from(err: aquadash_api::Error) -> Self {
        match err {
            aquadash_api::Error::Transport(ref e) => {
                let url = e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string);
                if let Some(status) = e.status() {
                    CoreError::Http {
                        status: status.as_u16(),
                        url,
                    }
                } else {
                    CoreError::ConnectionFailed {
                        url,
                        reason: e.to_string(),
                    }
                }
            }
            aquadash_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            aquadash_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            aquadash_api::Error::ClientBuild(msg) => CoreError::Internal(msg),
            aquadash_api::Error::Status { status, url } => CoreError::Http { status, url },
            aquadash_api::Error::Deserialization { message, body: _ } => {
                CoreError::InvalidPayload { message }
            }
            aquadash_api::Error::UnexpectedShape { url, message } => CoreError::InvalidPayload {
                message: format!("{url}: {message}"),
            },
        }
    }
}
