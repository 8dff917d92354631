// App access token acquisition.
//
// pnut.io issues app-level tokens through the OAuth2 client-credentials
// grant. The token endpoint is the one API surface that answers outside
// the `{meta, data}` envelope on success, so this goes through the raw
// executor and picks `access_token` out of the response itself.

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use secrecy::ExposeSecret;
use serde_json::Value;
use tracing::debug;
use url::form_urlencoded;

use crate::client::{ApiRequest, Client};
use crate::error::Error;

/// OAuth token endpoint, relative to the API origin.
const ACCESS_TOKEN_PATH: &str = "/oauth/access_token";

impl Client {
    /// Returns `true` if the client currently holds an app access token.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Exchange the configured client credentials for an app access token.
    ///
    /// `POST /oauth/access_token` with a form-encoded body and
    /// `grant_type=client_credentials`. Idempotent: if a token is
    /// already held (from a previous call or pre-seeded through
    /// [`Config`](crate::Config)), no network call is made and the
    /// held token is left untouched. Empty credentials fail with
    /// [`Error::InvalidConfiguration`] before any I/O.
    pub async fn authenticate(&self) -> Result<(), Error> {
        if self.is_authenticated() {
            debug!("app access token already held, skipping authentication");
            return Ok(());
        }

        if self.client_id().is_empty() || self.client_secret().expose_secret().is_empty() {
            return Err(Error::InvalidConfiguration);
        }

        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", self.client_id())
            .append_pair("client_secret", self.client_secret().expose_secret())
            .append_pair("grant_type", "client_credentials")
            .finish();

        let request = ApiRequest::new()
            .method(Method::POST)
            .path(ACCESS_TOKEN_PATH)
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/x-www-form-urlencoded"),
            )
            .body(body);

        debug!(client_id = self.client_id(), "requesting app access token");
        let response = self.request(request).await?;

        let token = response
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or(Error::MissingToken)?;

        self.set_token(token.to_owned());
        debug!("app access token stored");
        Ok(())
    }
}
