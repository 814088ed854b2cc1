// Shared transport configuration and HTTP verb semantics.
//
// The token endpoint and the Director API share TLS and timeout settings
// through this module. Status acceptance per verb and the response body cap
// also live here so every request path applies them the same way.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;

use crate::error::Error;

/// Maximum number of response body bytes read from any request.
/// Anything past this is dropped without error.
pub const BODY_LIMIT: usize = 64 * 1024;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// TLS verification mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate. Lab directors ship self-signed certs;
    /// only ever selected through an explicit `insecure` setting.
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("vdirector/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                tracing::warn!("TLS certificate verification disabled");
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// The four verbs the Director API is driven with.
///
/// Each verb carries its own notion of success: reads want `200`,
/// creates want `201`, and per-item mutations accept `200` or `204`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn method(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether `status` counts as success for this verb.
    pub fn accepts(self, status: StatusCode) -> bool {
        match self {
            Self::Get => status == StatusCode::OK,
            Self::Post => status == StatusCode::CREATED,
            Self::Put | Self::Delete => {
                status == StatusCode::OK || status == StatusCode::NO_CONTENT
            }
        }
    }
}

/// Read at most `limit` bytes of the response body.
///
/// Reading stops at the cap; the remainder of the stream is dropped with
/// the response.
pub(crate) async fn read_capped(
    mut resp: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, Error> {
    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        let room = limit.saturating_sub(body.len());
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_accepts_only_ok() {
        assert!(Verb::Get.accepts(StatusCode::OK));
        assert!(!Verb::Get.accepts(StatusCode::CREATED));
        assert!(!Verb::Get.accepts(StatusCode::NO_CONTENT));
    }

    #[test]
    fn post_accepts_only_created() {
        assert!(Verb::Post.accepts(StatusCode::CREATED));
        assert!(!Verb::Post.accepts(StatusCode::OK));
    }

    #[test]
    fn put_and_delete_accept_ok_or_no_content() {
        for verb in [Verb::Put, Verb::Delete] {
            assert!(verb.accepts(StatusCode::OK));
            assert!(verb.accepts(StatusCode::NO_CONTENT));
            assert!(!verb.accepts(StatusCode::CREATED));
            assert!(!verb.accepts(StatusCode::NOT_FOUND));
        }
    }

    #[test]
    fn default_transport_verifies_certificates() {
        let config = TransportConfig::default();
        assert_eq!(config.tls, TlsMode::System);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
