// OAuth2 credential lifecycle
//
// The Director issues bearer tokens from `POST /auth/token` using the
// password grant. A token is cached on disk between runs and reused only
// when the server marked it non-expiring (`expires_in == "-1"`); every other
// cached token is treated as already expired and replaced.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use reqwest::header::ACCEPT;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::transport::{BODY_LIMIT, read_capped};

/// Token endpoint, relative to the Director base URL.
pub const TOKEN_PATH: &str = "auth/token";

/// `expires_in` value the Director uses for tokens that never expire.
pub const NON_EXPIRING: &str = "-1";

// ── Credential ──────────────────────────────────────────────────────

/// OAuth2 password-grant configuration for one Director.
///
/// Immutable once built; the token it yields lives in [`CredentialStore`].
#[derive(Debug, Clone)]
pub struct Credential {
    pub server_host: String,
    pub server_port: u16,
    pub username: String,
    pub password: SecretString,
    pub grant_type: String,
    pub client_id: String,
    pub client_secret: SecretString,
}

impl Credential {
    /// `https://{host}:{port}/`
    pub fn base_url(&self) -> Result<Url, Error> {
        let raw = format!("https://{}:{}/", self.server_host, self.server_port);
        Ok(Url::parse(&raw)?)
    }
}

// ── Token ───────────────────────────────────────────────────────────

/// Token issued by the Director's OAuth2 server.
///
/// The same JSON document is persisted verbatim as the token cache.
#[derive(Debug, Clone, Deserialize)]
pub struct Token {
    pub access_token: SecretString,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub expires_in: String,
    #[serde(default)]
    pub refresh_token: Option<SecretString>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub issued_at: Option<String>,
    #[serde(default)]
    pub user: TokenOwner,
}

/// The user a token was issued to.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenOwner {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_external_user: bool,
    #[serde(default)]
    pub enable_two_factor: bool,
    #[serde(default)]
    pub idle_time_out: i64,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, rename = "primaryrole")]
    pub primary_role: String,
}

/// Where a token stands. A token is never partially valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Absent,
    Fresh,
    Expired,
}

impl Token {
    /// Validity of a token read back from the cache.
    ///
    /// Only the non-expiring sentinel counts as fresh. No timestamp
    /// arithmetic is done: any other `expires_in` is already expired.
    // TODO: compare `issued_at + expires_in` against the clock once the
    // Director's timestamp format is pinned down.
    pub fn cached_state(&self) -> TokenState {
        if self.expires_in == NON_EXPIRING {
            TokenState::Fresh
        } else {
            TokenState::Expired
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Num(serde_json::Number),
    Bool(bool),
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Str(s) => s,
            Scalar::Num(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

/// Deserialize any JSON scalar as its string form.
///
/// The Director sends some numeric fields as strings and some as numbers;
/// environment-sourced settings go through the same path.
pub fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Scalar::deserialize(de).map(String::from)
}

/// Optional variant of [`string_or_number`].
pub fn opt_string_or_number<'de, D: Deserializer<'de>>(
    de: D,
) -> Result<Option<String>, D::Error> {
    Option::<Scalar>::deserialize(de).map(|v| v.map(String::from))
}

fn log_token(token: &Token, origin: &str) {
    debug!(
        origin,
        token_type = token.token_type.as_deref().unwrap_or(""),
        expires_in = %token.expires_in,
        issued_at = token.issued_at.as_deref().unwrap_or(""),
        user = %token.user.name,
        primary_role = %token.user.primary_role,
        roles = ?token.user.roles,
        two_factor = token.user.enable_two_factor,
        "oauth token ready"
    );
}

// ── Token cache ─────────────────────────────────────────────────────

/// Side-channel file holding the last token JSON across process runs.
#[derive(Debug, Clone)]
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached token. Missing or unparsable files are a miss.
    pub fn load(&self) -> Option<Token> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %self.path.display(), "no cached token: {e}");
                return None;
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(token) => Some(token),
            Err(e) => {
                debug!(path = %self.path.display(), "ignoring unreadable token cache: {e}");
                None
            }
        }
    }

    /// Persist the raw token response body.
    ///
    /// On unix the file is owner read/write only.
    pub fn store(&self, raw: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;
        // `mode` only applies on creation; tighten files left by older runs.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(raw)
    }
}

// ── Credential store ────────────────────────────────────────────────

/// Owns the OAuth2 configuration and the current bearer token.
///
/// The token is swapped atomically; acquisition is serialized so that
/// concurrent callers observing an absent token trigger one request, not
/// one each.
pub struct CredentialStore {
    credential: Credential,
    token_url: Url,
    http: reqwest::Client,
    cache: Option<TokenCache>,
    current: ArcSwapOption<Token>,
    acquire_lock: Mutex<()>,
}

impl CredentialStore {
    /// Build a store for the Director at `base_url`. No network traffic
    /// happens until [`initialize`](Self::initialize) or
    /// [`bearer`](Self::bearer).
    pub fn new(
        credential: Credential,
        base_url: &Url,
        http: reqwest::Client,
        cache: Option<TokenCache>,
    ) -> Result<Self, Error> {
        let token_url = base_url.join(TOKEN_PATH)?;
        Ok(Self {
            credential,
            token_url,
            http,
            cache,
            current: ArcSwapOption::empty(),
            acquire_lock: Mutex::new(()),
        })
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Current in-memory state. Expired tokens are dropped on sight, so
    /// this is only ever `Absent` or `Fresh`.
    pub fn state(&self) -> TokenState {
        if self.current.load().is_some() {
            TokenState::Fresh
        } else {
            TokenState::Absent
        }
    }

    /// Look for a usable token in the cache file.
    pub fn load_cached_token(&self) -> Option<Token> {
        let token = self.cache.as_ref()?.load()?;
        match token.cached_state() {
            TokenState::Fresh => Some(token),
            TokenState::Expired | TokenState::Absent => {
                debug!(
                    expires_in = %token.expires_in,
                    "cached token treated as expired, a new one is required"
                );
                None
            }
        }
    }

    /// Adopt a usable cached token, or fetch a new one from the server.
    pub async fn initialize(&self) -> Result<(), Error> {
        if let Some(token) = self.load_cached_token() {
            log_token(&token, "cache");
            self.current.store(Some(Arc::new(token)));
            return Ok(());
        }
        self.acquire_token().await.map(|_| ())
    }

    /// Unconditionally request a new token and make it current.
    pub async fn acquire_token(&self) -> Result<Arc<Token>, Error> {
        let _guard = self.acquire_lock.lock().await;
        self.request_token().await
    }

    /// The token to sign the next request with, acquiring one if absent.
    pub async fn bearer(&self) -> Result<Arc<Token>, Error> {
        if let Some(token) = self.current.load_full() {
            return Ok(token);
        }
        let _guard = self.acquire_lock.lock().await;
        // Another caller may have finished acquiring while we waited.
        if let Some(token) = self.current.load_full() {
            return Ok(token);
        }
        self.request_token().await
    }

    /// Drop the current token; the next [`bearer`](Self::bearer) call
    /// acquires a new one.
    pub fn invalidate(&self) {
        debug!("invalidating current oauth token");
        self.current.store(None);
    }

    async fn request_token(&self) -> Result<Arc<Token>, Error> {
        let cred = &self.credential;
        debug!(
            url = %self.token_url,
            user = %cred.username,
            client_id = %cred.client_id,
            grant_type = %cred.grant_type,
            "requesting oauth token"
        );

        let body = json!({
            "client_id": cred.client_id,
            "client_secret": cred.client_secret.expose_secret(),
            "grant_type": cred.grant_type,
            "username": cred.username,
            "password": cred.password.expose_secret(),
        });

        let resp = self
            .http
            .post(self.token_url.clone())
            .header(ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Authentication {
                message: format!("token request failed: {e}"),
            })?;

        let status = resp.status();
        let raw = read_capped(resp, BODY_LIMIT)
            .await
            .map_err(|e| Error::Authentication {
                message: format!("failed to read token response: {e}"),
            })?;

        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("token request rejected (HTTP {status})"),
            });
        }

        let token: Token = serde_json::from_slice(&raw).map_err(|e| Error::Authentication {
            message: format!("malformed token response: {e}"),
        })?;
        log_token(&token, "server");

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(&raw) {
                warn!(path = %cache.path().display(), "failed to write token cache: {e}");
            }
        }

        let token = Arc::new(token);
        self.current.store(Some(Arc::clone(&token)));
        Ok(token)
    }
}
