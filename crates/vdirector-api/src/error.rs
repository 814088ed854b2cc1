use thiserror::Error;

/// Top-level error type for the `vdirector-api` crate.
///
/// Covers every failure mode of the Director API surface: token
/// acquisition, transport, status validation, request validation and
/// payload decoding. `vdirector-core` maps these into user-facing errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// OAuth2 token acquisition failed (server unreachable, rejected
    /// credentials, or a response that is not a token).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The configured base URL cannot carry path segments.
    #[error("Base URL cannot be used for API paths: {0}")]
    InvalidBaseUrl(String),

    /// The server answered with a status the verb does not accept.
    #[error("HTTP {method} {url} returned {status}")]
    UnexpectedStatus {
        method: &'static str,
        url: String,
        status: reqwest::StatusCode,
    },

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Request ─────────────────────────────────────────────────────
    /// Request rejected locally before any network call.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Request body could not be serialized.
    #[error("Failed to encode request body: {0}")]
    Encode(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error came out of token acquisition.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// HTTP status attached to this error, if the server answered at all.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Build a `Deserialization` error with a bounded body preview in the
    /// message and the full (already capped) body attached.
    pub(crate) fn decode(err: &serde_json::Error, body: &[u8]) -> Self {
        let body = String::from_utf8_lossy(body).into_owned();
        let preview: String = body.chars().take(200).collect();
        Self::Deserialization {
            message: format!("{err} (body preview: {preview:?})"),
            body,
        }
    }
}
