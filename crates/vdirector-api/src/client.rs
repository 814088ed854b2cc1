// Director API HTTP client
//
// Wraps `reqwest::Client` with Director URL construction, bearer signing and
// per-verb status validation. Endpoint groups (addresses, organizations,
// appliances) are implemented as inherent methods in separate files to keep
// this module focused on transport mechanics.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::{Credential, CredentialStore, TokenCache};
use crate::error::Error;
use crate::transport::{BODY_LIMIT, TransportConfig, Verb, read_capped};

/// Query parameters attached to a request.
pub type Query<'a> = &'a [(&'a str, &'a str)];

/// Raw HTTP client for the Director REST API.
///
/// Every request is signed with the bearer token held by the embedded
/// [`CredentialStore`] and carries JSON content negotiation headers.
/// Requests run one at a time from the caller's point of view; nothing is
/// retried.
pub struct DirectorClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: CredentialStore,
}

impl DirectorClient {
    /// Build a client for `https://{host}:{port}/` and make sure a token is
    /// available, from the cache or from the server.
    ///
    /// Fails with [`Error::Authentication`] when no token can be obtained.
    pub async fn connect(
        credential: Credential,
        transport: &TransportConfig,
        cache: Option<TokenCache>,
    ) -> Result<Self, Error> {
        let base_url = credential.base_url()?;
        Self::connect_to(base_url, credential, transport, cache).await
    }

    /// Like [`connect`](Self::connect) but against an explicit base URL.
    pub async fn connect_to(
        base_url: Url,
        credential: Credential,
        transport: &TransportConfig,
        cache: Option<TokenCache>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let client = Self::with_client(http, base_url, credential, cache)?;
        client.credentials.initialize().await?;
        Ok(client)
    }

    /// Wrap a pre-built `reqwest::Client`. The token is acquired lazily on
    /// the first request.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        credential: Credential,
        cache: Option<TokenCache>,
    ) -> Result<Self, Error> {
        let base_url = normalize_base_url(base_url);
        let credentials = CredentialStore::new(credential, &base_url, http.clone(), cache)?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// The Director base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Append path segments to the base URL, percent-encoding each one.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    pub(crate) async fn get(&self, url: Url, query: Query<'_>) -> Result<Vec<u8>, Error> {
        self.send(Verb::Get, url, query, None).await
    }

    pub(crate) async fn post(
        &self,
        url: Url,
        query: Query<'_>,
        body: &(impl Serialize + Sync),
    ) -> Result<Vec<u8>, Error> {
        let body = encode(body)?;
        self.send(Verb::Post, url, query, Some(body)).await
    }

    pub(crate) async fn put(
        &self,
        url: Url,
        query: Query<'_>,
        body: &(impl Serialize + Sync),
    ) -> Result<Vec<u8>, Error> {
        let body = encode(body)?;
        self.send(Verb::Put, url, query, Some(body)).await
    }

    pub(crate) async fn delete(
        &self,
        url: Url,
        query: Query<'_>,
        body: &(impl Serialize + Sync),
    ) -> Result<Vec<u8>, Error> {
        let body = encode(body)?;
        self.send(Verb::Delete, url, query, Some(body)).await
    }

    /// Sign, send and validate one request, returning the capped body.
    async fn send(
        &self,
        verb: Verb,
        url: Url,
        query: Query<'_>,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, Error> {
        debug!("{} {}", verb.as_str(), url);
        let token = self.credentials.bearer().await?;

        let mut builder = self
            .http
            .request(verb.method(), url.clone())
            .bearer_auth(token.access_token.expose_secret())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            trace!(body = %String::from_utf8_lossy(&body), "request body");
            builder = builder.body(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let body = read_capped(resp, BODY_LIMIT).await?;

        if !verb.accepts(status) {
            debug!(%status, "{} {} rejected", verb.as_str(), url);
            return Err(Error::UnexpectedStatus {
                method: verb.as_str(),
                url: url.to_string(),
                status,
            });
        }

        trace!(bytes = body.len(), "{} {} ok", verb.as_str(), url);
        Ok(body)
    }
}

/// Decode a response body into `T`.
pub(crate) fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, Error> {
    serde_json::from_slice(body).map_err(|e| Error::decode(&e, body))
}

fn encode(body: &(impl Serialize + Sync)) -> Result<Vec<u8>, Error> {
    serde_json::to_vec(body).map_err(|e| Error::Encode(e.to_string()))
}

/// Ensure the base path ends with `/` so relative joins keep any prefix.
fn normalize_base_url(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
