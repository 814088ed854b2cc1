// ── Runtime connection configuration ──
//
// These types describe *how* to reach a Director. They carry credential
// data and connection tuning, but never touch disk or the environment.
// `vdirector-config` (or any other host) constructs a `DirectorConfig`
// and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;
use vdirector_api::{Credential, TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification entirely. Must be asked for explicitly.
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Configuration for connecting to a single Director.
#[derive(Debug, Clone)]
pub struct DirectorConfig {
    /// OAuth2 password-grant credential; also names host and port.
    pub credential: Credential,
    /// Overrides `https://{host}:{port}/` when set.
    pub base_url: Option<Url>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Token cache file. `None` disables caching.
    pub token_cache: Option<PathBuf>,
}

impl DirectorConfig {
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            base_url: None,
            tls: TlsVerification::default(),
            timeout: vdirector_api::transport::DEFAULT_TIMEOUT,
            token_cache: None,
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
        }
    }
}
