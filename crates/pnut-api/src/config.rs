// Client configuration.
//
// The API origin is fixed in production; the override exists for tests
// and staging deployments. The client secret is held behind `secrecy`
// and only exposed at the point the token request body is built.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::error::Error;

/// Production origin for the pnut.io API, version 0.
pub const API_BASE: &str = "https://api.pnut.io/v0";

/// Request timeout applied to every HTTP call.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for building a [`Client`](crate::Client).
///
/// ```no_run
/// use pnut_api::Config;
///
/// let config = Config::new("my-client-id", "my-client-secret".to_string());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// OAuth client id issued by pnut.io.
    pub client_id: String,
    /// OAuth client secret paired with `client_id`.
    pub client_secret: SecretString,
    /// Pre-seeded app access token. When set and non-empty,
    /// `authenticate` becomes a no-op.
    pub token: Option<String>,
    /// API origin including the version prefix. Defaults to [`API_BASE`].
    pub base_url: Url,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Config {
    /// Configuration with the production API origin and default timeout.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<SecretString>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token: None,
            base_url: Url::parse(API_BASE).expect("default API base is a valid URL"),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Seed an already-acquired app access token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Point the client at a different API origin.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Override the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the underlying HTTP client.
    pub(crate) fn build_http(&self) -> Result<reqwest::Client, Error> {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("pnut-api/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(http)
    }
}
