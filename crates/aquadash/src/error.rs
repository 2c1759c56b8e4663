//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use aquadash_config::ConfigError;
use aquadash_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach {url}")]
    #[diagnostic(
        code(aquadash::connection_failed),
        help("Check the URL and your network connection.\nReason: {reason}")
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(aquadash::timeout),
        help("Increase the timeout with --timeout or polling.timeout_secs.")
    )]
    Timeout { seconds: u64 },

    #[error("HTTP {status} from {url}")]
    #[diagnostic(
        code(aquadash::http),
        help("401/403 usually means the database rules reject this path.")
    )]
    Http { status: u16, url: String },

    #[error("Invalid payload: {message}")]
    #[diagnostic(code(aquadash::payload))]
    InvalidPayload { message: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(aquadash::not_found),
        help("Run: aquadash {list_command} to see what is configured")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(aquadash::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(
        code(aquadash::config),
        help("Check the config file (see: aquadash config path) and AQUADASH_* variables.")
    )]
    Config(Box<figment::Error>),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(aquadash::render))]
    Render(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(aquadash::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Http {
                status: 401 | 403, ..
            } => exit_code::AUTH,
            Self::Http { status: 404, .. } | Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout { timeout_secs } => Self::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Http { status, url } => Self::Http { status, url },
            CoreError::InvalidPayload { message } => Self::InvalidPayload { message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownSite { site } => Self::NotFound {
                resource_type: "site".into(),
                identifier: site,
                list_command: "sites".into(),
            },
            ConfigError::UnknownItem { site, kind, name } => Self::NotFound {
                resource_type: kind.into(),
                identifier: name,
                list_command: format!("config show  # site {site}"),
            },
            ConfigError::Figment(err) => Self::Config(err),
            ConfigError::Io(err) => Self::Io(err),
            ConfigError::Serialization(err) => Self::Render(err.to_string()),
        }
    }
}
