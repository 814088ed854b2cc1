// ── Core error types ──
//
// User-facing errors from vdirector-core. The `From<vdirector_api::Error>`
// impl translates transport-layer errors into domain-appropriate variants;
// raw reqwest and serde errors never leave this crate.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to director at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Director rejected {method} {url} with HTTP {status}")]
    UnexpectedStatus {
        method: String,
        url: String,
        status: u16,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Malformed director response: {message}")]
    Decode { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// HTTP status for errors the director answered, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vdirector_api::Error> for CoreError {
    fn from(err: vdirector_api::Error) -> Self {
        match err {
            vdirector_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            vdirector_api::Error::Transport(ref e) => {
                let url = e
                    .url()
                    .map_or_else(|| "<unknown>".into(), ToString::to_string);
                if e.is_timeout() {
                    CoreError::Timeout { url }
                } else {
                    CoreError::ConnectionFailed {
                        url,
                        reason: e.to_string(),
                    }
                }
            }
            vdirector_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            vdirector_api::Error::InvalidBaseUrl(url) => CoreError::Config {
                message: format!("Invalid director base URL: {url}"),
            },
            vdirector_api::Error::UnexpectedStatus {
                method,
                url,
                status,
            } => CoreError::UnexpectedStatus {
                method: method.to_owned(),
                url,
                status: status.as_u16(),
            },
            vdirector_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            vdirector_api::Error::Validation { message } => {
                CoreError::ValidationFailed { message }
            }
            vdirector_api::Error::Encode(msg) => {
                CoreError::Internal(format!("Failed to encode request: {msg}"))
            }
            vdirector_api::Error::Deserialization { message, body: _ } => {
                CoreError::Decode { message }
            }
        }
    }
}
