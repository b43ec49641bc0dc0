// ABOUTME: Immutable API session shared by every platform call.
// ABOUTME: Holds the validated API root, the bearer token, and a pooled HTTP client.

use super::error::FoundryError;
use std::fmt;
use std::time::Duration;

/// Settings used to open a [`Session`].
#[derive(Clone)]
pub struct SessionConfig {
    /// Base URL of the API, e.g. `https://api.sys.example.com`.
    pub api_url: String,
    /// Bearer token obtained out of band.
    pub token: String,
    /// Accept any server certificate.
    pub skip_ssl_validation: bool,
    /// Bound on establishing a connection (default: 30 seconds).
    pub connect_timeout: Duration,
    /// Bound on a single request/response exchange (default: 2 minutes).
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl SessionConfig {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token: token.into(),
            skip_ssl_validation: false,
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            user_agent: concat!("cfrollout/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn skip_ssl_validation(mut self, skip: bool) -> Self {
        self.skip_ssl_validation = skip;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .field("skip_ssl_validation", &self.skip_ssl_validation)
            .finish_non_exhaustive()
    }
}

/// An open API session. Build it once and share it by reference.
pub struct Session {
    base_url: String,
    token: String,
    client: reqwest::Client,
    request_timeout: Duration,
}

impl Session {
    pub fn open(config: SessionConfig) -> Result<Self, FoundryError> {
        let base_url = parse_api_url(&config.api_url)?;
        if config.token.trim().is_empty() {
            return Err(FoundryError::InvalidRequest(
                "an API token is required".to_string(),
            ));
        }

        if config.skip_ssl_validation {
            tracing::warn!(api = %base_url, "TLS certificate validation is disabled");
        }
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.skip_ssl_validation)
            .build()
            .map_err(|e| FoundryError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            token: config.token,
            client,
            request_timeout: config.request_timeout,
        })
    }

    /// The API root without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url_for(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub(crate) fn authorization(&self) -> String {
        let token = self.token.trim();
        if token
            .get(..7)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("bearer "))
        {
            token.to_string()
        } else {
            format!("bearer {token}")
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Validate an http(s) API URL and strip any trailing slash.
fn parse_api_url(url: &str) -> Result<String, FoundryError> {
    let parsed = reqwest::Url::parse(url.trim())
        .map_err(|e| FoundryError::InvalidRequest(format!("invalid API URL {url:?}: {e}")))?;

    match parsed.scheme() {
        "https" | "http" => {}
        other => {
            return Err(FoundryError::InvalidRequest(format!(
                "unsupported URL scheme {other:?}; use https:// or http://"
            )));
        }
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(FoundryError::InvalidRequest(format!(
            "API URL {url:?} has no host"
        )));
    }
    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(FoundryError::InvalidRequest(format!(
            "API URL {url:?} must not carry a query or fragment"
        )));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}
