//! Shared configuration for Versa Director tools.
//!
//! Layered settings (defaults, TOML file, `VERSA_DIRECTOR_*` environment,
//! explicit overrides), credential resolution with a keyring fallback for
//! secrets, scope resolution, and translation to
//! `vdirector_core::DirectorConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use vdirector_api::auth::opt_string_or_number;
use vdirector_core::{Credential, DirectorConfig, Scope, TlsVerification};

/// Keyring service under which secrets are looked up.
const KEYRING_SERVICE: &str = "vdirector";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} is missing or empty; set it explicitly or via {env}")]
    Missing { field: &'static str, env: &'static str },

    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Settings ────────────────────────────────────────────────────────

/// Connection settings for one Director.
///
/// Every field is optional at this layer so that partial sources merge;
/// required values are checked in [`Settings::into_director_config`].
/// `None` fields are skipped on serialization so explicit overrides only
/// replace what they actually set. Text fields accept numbers and booleans
/// too, since figment parses environment values before they reach serde.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub username: Option<String>,

    /// Plaintext password. Prefer the keyring or the environment.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub password: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub oauth_grant_type: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub oauth_client_id: Option<String>,

    /// Plaintext client secret. Prefer the keyring or the environment.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string_or_number"
    )]
    pub oauth_client_secret: Option<String>,

    /// Skip TLS certificate verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Path to a custom CA certificate (PEM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Token cache file; defaults to [`token_cache_path`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_cache: Option<PathBuf>,
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "versa-networks", "vdirector")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default token cache file for one user on one Director.
///
/// Keyed by host, port and username so a token is never replayed against
/// another Director or account.
pub fn token_cache_path(host: &str, port: u16, username: &str) -> PathBuf {
    let file = format!("{}-{port}-{}.json", file_safe(host), file_safe(username));
    project_dirs().map_or_else(
        || dirs_fallback(".cache").join("tokens").join(&file),
        |dirs| dirs.cache_dir().join("tokens").join(&file),
    )
}

fn file_safe(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn dirs_fallback(kind: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(kind);
    p.push("vdirector");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load settings from the config file and environment, then apply
/// `overrides` on top.
pub fn load_settings(overrides: &Settings) -> Result<Settings, ConfigError> {
    let path = config_path();
    debug!(path = %path.display(), "loading director settings");
    Settings::from_figment(&layered(&path, overrides))
}

/// defaults < TOML file < `VERSA_DIRECTOR_*` environment < overrides
fn layered(path: &Path, overrides: &Settings) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Settings::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("VERSA_DIRECTOR_"))
        .merge(Serialized::defaults(overrides))
}

impl Settings {
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }

    /// Validate required values and build the core connection config.
    ///
    /// Required values are checked in a fixed order: host, port, username,
    /// password, grant type, client id, client secret. The first missing one
    /// is reported.
    pub fn into_director_config(self) -> Result<DirectorConfig, ConfigError> {
        self.into_director_config_with(keyring_secret)
    }

    fn into_director_config_with(
        self,
        secret_lookup: impl Fn(&str, &str) -> Option<String>,
    ) -> Result<DirectorConfig, ConfigError> {
        let server_host = required(self.host, "host", "VERSA_DIRECTOR_HOST")?;
        let server_port = match self.port {
            Some(0) => {
                return Err(ConfigError::Validation {
                    field: "port".into(),
                    reason: "must be between 1 and 65535".into(),
                });
            }
            Some(port) => port,
            None => {
                return Err(ConfigError::Missing {
                    field: "port",
                    env: "VERSA_DIRECTOR_PORT",
                });
            }
        };
        let username = required(self.username, "username", "VERSA_DIRECTOR_USERNAME")?;
        let password = required(
            non_empty(self.password).or_else(|| secret_lookup(&username, "password")),
            "password",
            "VERSA_DIRECTOR_PASSWORD",
        )?;
        let grant_type = required(
            self.oauth_grant_type,
            "oauth_grant_type",
            "VERSA_DIRECTOR_OAUTH_GRANT_TYPE",
        )?;
        let client_id = required(
            self.oauth_client_id,
            "oauth_client_id",
            "VERSA_DIRECTOR_OAUTH_CLIENT_ID",
        )?;
        let client_secret = required(
            non_empty(self.oauth_client_secret)
                .or_else(|| secret_lookup(&username, "client-secret")),
            "oauth_client_secret",
            "VERSA_DIRECTOR_OAUTH_CLIENT_SECRET",
        )?;

        let tls = if self.insecure.unwrap_or(false) {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path)
        } else {
            TlsVerification::SystemDefaults
        };

        let token_cache = self
            .token_cache
            .unwrap_or_else(|| token_cache_path(&server_host, server_port, &username));

        let mut config = DirectorConfig::new(Credential {
            server_host,
            server_port,
            username,
            password: SecretString::from(password),
            grant_type,
            client_id,
            client_secret: SecretString::from(client_secret),
        });
        config.tls = tls;
        config.timeout = Duration::from_secs(self.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));
        config.token_cache = Some(token_cache);
        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(
    value: Option<String>,
    field: &'static str,
    env: &'static str,
) -> Result<String, ConfigError> {
    non_empty(value).ok_or(ConfigError::Missing { field, env })
}

fn keyring_secret(username: &str, kind: &str) -> Option<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{username}/{kind}")).ok()?;
    match entry.get_password() {
        Ok(secret) => {
            debug!(username, kind, "using secret from keyring");
            Some(secret)
        }
        Err(_) => None,
    }
}

// ── Scope resolution ────────────────────────────────────────────────

/// Resolve the device/organization scope, falling back to
/// `VERSA_VOS_DEVICE_NAME` and `VERSA_VOS_ORGANIZATION_NAME`.
pub fn resolve_scope(device: Option<&str>, organization: Option<&str>) -> Result<Scope, ConfigError> {
    resolve_scope_with(device, organization, |key| std::env::var(key).ok())
}

/// [`resolve_scope`] with a custom environment lookup.
pub fn resolve_scope_with(
    device: Option<&str>,
    organization: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Scope, ConfigError> {
    let device = required(
        non_empty(device.map(str::to_owned)).or_else(|| lookup("VERSA_VOS_DEVICE_NAME")),
        "device_name",
        "VERSA_VOS_DEVICE_NAME",
    )?;
    let organization = required(
        non_empty(organization.map(str::to_owned))
            .or_else(|| lookup("VERSA_VOS_ORGANIZATION_NAME")),
        "organization_name",
        "VERSA_VOS_ORGANIZATION_NAME",
    )?;
    Ok(Scope {
        device,
        organization,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use secrecy::ExposeSecret;

    use super::*;

    const FULL: &str = r#"
        host = "director.example.net"
        port = 9182
        username = "admin"
        password = "versa123"
        oauth_grant_type = "password"
        oauth_client_id = "voae_rest"
        oauth_client_secret = "asrevnet_123"
    "#;

    fn settings(toml: &str) -> Settings {
        Settings::from_figment(&Figment::from(Toml::string(toml))).unwrap()
    }

    fn no_keyring(_: &str, _: &str) -> Option<String> {
        None
    }

    #[test]
    fn full_settings_build_a_director_config() {
        let config = settings(FULL).into_director_config_with(no_keyring).unwrap();
        assert_eq!(config.credential.server_host, "director.example.net");
        assert_eq!(config.credential.server_port, 9182);
        assert_eq!(config.credential.client_secret.expose_secret(), "asrevnet_123");
        assert_eq!(config.tls, TlsVerification::SystemDefaults);
        assert_eq!(config.timeout, Duration::from_secs(10));
        let cache = config.token_cache.unwrap();
        assert_eq!(
            cache.file_name().unwrap(),
            "director.example.net-9182-admin.json"
        );
    }

    #[test]
    fn token_cache_is_keyed_per_director_and_user() {
        let a = token_cache_path("10.0.0.1", 9182, "admin");
        let b = token_cache_path("10.0.0.2", 9182, "admin");
        let c = token_cache_path("10.0.0.1", 9182, "ops");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(
            token_cache_path("dir", 443, "corp/alice").file_name().unwrap(),
            "dir-443-corp_alice.json"
        );
    }

    #[test]
    fn numeric_env_values_load_as_text() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("config.toml", "host = \"director.example.net\"\nport = 9182")?;
            jail.set_env("VERSA_DIRECTOR_USERNAME", "1001");
            jail.set_env("VERSA_DIRECTOR_PASSWORD", "12345");
            jail.set_env("VERSA_DIRECTOR_OAUTH_GRANT_TYPE", "password");
            jail.set_env("VERSA_DIRECTOR_OAUTH_CLIENT_ID", "42");
            jail.set_env("VERSA_DIRECTOR_OAUTH_CLIENT_SECRET", "true");

            let s = Settings::from_figment(&layered(
                Path::new("config.toml"),
                &Settings::default(),
            ))
            .unwrap();
            assert_eq!(s.username.as_deref(), Some("1001"));
            assert_eq!(s.password.as_deref(), Some("12345"));
            assert_eq!(s.oauth_client_id.as_deref(), Some("42"));
            assert_eq!(s.oauth_client_secret.as_deref(), Some("true"));
            assert_eq!(s.port, Some(9182));

            let config = s.into_director_config_with(no_keyring).unwrap();
            assert_eq!(config.credential.password.expose_secret(), "12345");
            assert_eq!(config.credential.client_id, "42");
            Ok(())
        });
    }

    #[test]
    fn overrides_beat_environment() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("VERSA_DIRECTOR_HOST", "from-env");
            let overrides = Settings {
                host: Some("from-plan".into()),
                ..Settings::default()
            };
            let s = Settings::from_figment(&layered(Path::new("missing.toml"), &overrides))
                .unwrap();
            assert_eq!(s.host.as_deref(), Some("from-plan"));
            Ok(())
        });
    }

    #[test]
    fn missing_host_is_reported_first() {
        let err = Settings::default()
            .into_director_config_with(no_keyring)
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::Missing { field: "host", env: "VERSA_DIRECTOR_HOST" }),
            "{err:?}"
        );
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let mut s = settings(FULL);
        s.oauth_client_id = Some(String::new());
        let err = s.into_director_config_with(no_keyring).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { field: "oauth_client_id", .. }));
    }

    #[test]
    fn secrets_fall_back_to_keyring() {
        let mut s = settings(FULL);
        s.password = None;
        let config = s
            .into_director_config_with(|user, kind| {
                (user == "admin" && kind == "password").then(|| "from-keyring".to_owned())
            })
            .unwrap();
        assert_eq!(config.credential.password.expose_secret(), "from-keyring");
    }

    #[test]
    fn insecure_flag_is_the_only_way_to_skip_verification() {
        let mut s = settings(FULL);
        s.ca_cert = Some(PathBuf::from("/etc/ssl/director.pem"));
        let config = s.clone().into_director_config_with(no_keyring).unwrap();
        assert_eq!(
            config.tls,
            TlsVerification::CustomCa(PathBuf::from("/etc/ssl/director.pem"))
        );

        s.insecure = Some(true);
        let config = s.into_director_config_with(no_keyring).unwrap();
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn overrides_replace_only_what_they_set() {
        let overrides = Settings {
            port: Some(443),
            ..Settings::default()
        };
        let figment = Figment::from(Toml::string(FULL)).merge(Serialized::defaults(&overrides));
        let s = Settings::from_figment(&figment).unwrap();
        assert_eq!(s.port, Some(443));
        assert_eq!(s.host.as_deref(), Some("director.example.net"));
    }

    #[test]
    fn scope_prefers_explicit_values() {
        let scope = resolve_scope_with(Some("Branch-1"), Some("ACME"), |_| {
            Some("from-env".into())
        })
        .unwrap();
        assert_eq!(scope.id(), "Branch-1/ACME");
    }

    #[test]
    fn scope_falls_back_to_environment() {
        let scope = resolve_scope_with(None, Some(""), |key| match key {
            "VERSA_VOS_DEVICE_NAME" => Some("Branch-2".into()),
            "VERSA_VOS_ORGANIZATION_NAME" => Some("Tenant".into()),
            _ => None,
        })
        .unwrap();
        assert_eq!(scope.device, "Branch-2");
        assert_eq!(scope.organization, "Tenant");
    }

    #[test]
    fn missing_scope_names_the_variable() {
        let err = resolve_scope_with(Some("Branch-1"), None, |_| None).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing { env: "VERSA_VOS_ORGANIZATION_NAME", .. }
        ));
    }
}
