// HTTP client core: request execution and the authenticated layer.
//
// Two layers live here. `request` is the bare executor: build a URL from
// the configured origin, send, parse the `{meta, data}` envelope, and
// turn `meta.error_message` into an error. `authenticated_request` sits
// on top and stamps the bearer token and JSON content type onto every
// call before delegating. Typed endpoint operations (streams.rs,
// apps.rs) go through the verb helpers at the bottom.

use std::sync::RwLock;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::Error;
use crate::models::Meta;

// ── ApiRequest ───────────────────────────────────────────────────────

/// A single request against the API.
///
/// Everything is optional at the type level, matching the wire surface:
/// requiredness is checked at execution time, so a missing `path` is
/// reported as [`Error::InvalidParameters`] before any I/O happens.
/// The method defaults to `GET`.
#[derive(Debug, Default)]
pub struct ApiRequest {
    pub method: Option<Method>,
    /// Path relative to the API origin, e.g. `"/streams/mykey"`.
    pub path: Option<String>,
    pub headers: Option<HeaderMap>,
    /// Raw request body, already encoded.
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add a single header, replacing any previous value for the name.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers
            .get_or_insert_with(HeaderMap::new)
            .insert(name, value);
        self
    }

    /// Set a raw, already-encoded request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `body` as JSON and use it as the request body.
    pub fn json(mut self, body: &(impl Serialize + Sync)) -> Result<Self, Error> {
        let encoded = serde_json::to_string(body).map_err(|e| Error::Deserialization {
            message: format!("failed to encode request body: {e}"),
            body: String::new(),
        })?;
        self.body = Some(encoded);
        Ok(self)
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the pnut.io API.
///
/// Holds the HTTP connection pool, the configured credentials, and the
/// app access token once acquired. Cheap to share behind an `Arc`; all
/// methods take `&self`.
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    client_id: String,
    client_secret: SecretString,
    /// App access token. Absent until `authenticate` succeeds or a
    /// token is pre-seeded through `Config`; immutable once set.
    token: RwLock<Option<String>>,
}

impl Client {
    /// Build a client from the given configuration.
    pub fn new(config: Config) -> Result<Self, Error> {
        let http = config.build_http()?;
        let Config {
            client_id,
            client_secret,
            token,
            base_url,
            ..
        } = config;

        Ok(Self {
            http,
            base_url,
            client_id,
            client_secret,
            token: RwLock::new(token.filter(|token| !token.is_empty())),
        })
    }

    /// The configured OAuth client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub(crate) fn client_secret(&self) -> &SecretString {
        &self.client_secret
    }

    /// The app access token currently held, if any.
    pub fn token(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }

    /// Store the app access token. First writer wins; the token is
    /// immutable once set.
    pub(crate) fn set_token(&self, token: String) {
        let mut guard = self.token.write().expect("token lock poisoned");
        if guard.is_none() {
            *guard = Some(token);
        }
    }

    /// Build a full URL by appending `path` to the configured origin.
    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    // ── Request executor ─────────────────────────────────────────────

    /// Execute a request and return the decoded response envelope.
    ///
    /// The HTTP status is deliberately ignored: the API reports failure
    /// in-band, so the body is parsed regardless and a
    /// `meta.error_message` becomes [`Error::Api`] whatever the status
    /// line said. On success the full envelope is returned undissected,
    /// which lets the token endpoint (whose response has no `data`
    /// wrapper) share this path.
    pub async fn request(&self, request: ApiRequest) -> Result<Value, Error> {
        let method = request.method.unwrap_or(Method::GET);
        let Some(path) = request.path else {
            return Err(Error::InvalidParameters { key: "path" });
        };
        let url = self.api_url(&path)?;
        debug!("{method} {url}");

        let mut builder = self.http.request(method, url);
        if let Some(headers) = request.headers {
            builder = builder.headers(headers);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let body = response.text().await?;

        let envelope: Value = serde_json::from_str(&body).map_err(|e| {
            // Truncate on character boundaries; error pages are not
            // always ASCII.
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })?;

        if let Some(message) = envelope
            .pointer("/meta/error_message")
            .and_then(Value::as_str)
        {
            let code = envelope
                .pointer("/meta/code")
                .and_then(Value::as_u64)
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or_default();
            debug!(code, "API reported an error: {message}");
            return Err(Error::Api {
                message: message.to_owned(),
                code,
            });
        }

        Ok(envelope)
    }

    // ── Authenticated layer ──────────────────────────────────────────

    /// Execute a request with the app access token stamped on, and
    /// split the envelope into its `meta` and `data` halves.
    ///
    /// Fails with [`Error::Unauthenticated`] before any I/O if no token
    /// is held. The bearer and JSON content-type headers always win
    /// over caller-supplied values. A success envelope without `data`
    /// yields `Value::Null`.
    pub async fn authenticated_request(
        &self,
        request: ApiRequest,
    ) -> Result<(Meta, Value), Error> {
        #[derive(serde::Deserialize)]
        struct RawEnvelope {
            #[serde(default)]
            meta: Meta,
            #[serde(default)]
            data: Value,
        }

        let Some(token) = self.token() else {
            return Err(Error::Unauthenticated);
        };
        // A token that cannot form a header value is treated as absent.
        let bearer = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::Unauthenticated)?;

        let ApiRequest {
            method,
            path,
            headers,
            body,
        } = request;
        let mut headers = headers.unwrap_or_default();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let envelope = self
            .request(ApiRequest {
                method,
                path,
                headers: Some(headers),
                body,
            })
            .await?;

        let RawEnvelope { meta, data } = decode(&envelope)?;
        Ok((meta, data))
    }

    // ── Authenticated verb helpers ───────────────────────────────────

    /// Authenticated GET, decoding the envelope's `data`.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: String) -> Result<(Meta, T), Error> {
        let (meta, data) = self
            .authenticated_request(ApiRequest::new().path(path))
            .await?;
        Ok((meta, decode(&data)?))
    }

    /// Authenticated DELETE, decoding the envelope's `data`.
    pub(crate) async fn delete<T: DeserializeOwned>(
        &self,
        path: String,
    ) -> Result<(Meta, T), Error> {
        let (meta, data) = self
            .authenticated_request(ApiRequest::new().method(Method::DELETE).path(path))
            .await?;
        Ok((meta, decode(&data)?))
    }

    /// Authenticated POST with a JSON body, decoding the envelope's `data`.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: String,
        body: &(impl Serialize + Sync),
    ) -> Result<(Meta, T), Error> {
        let request = ApiRequest::new().method(Method::POST).path(path).json(body)?;
        let (meta, data) = self.authenticated_request(request).await?;
        Ok((meta, decode(&data)?))
    }

    /// Authenticated PUT with a JSON body, decoding the envelope's `data`.
    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        path: String,
        body: &(impl Serialize + Sync),
    ) -> Result<(Meta, T), Error> {
        let request = ApiRequest::new().method(Method::PUT).path(path).json(body)?;
        let (meta, data) = self.authenticated_request(request).await?;
        Ok((meta, decode(&data)?))
    }
}

/// Decode a JSON value into a typed model, keeping the raw payload in
/// the error for debugging.
pub(crate) fn decode<T: DeserializeOwned>(data: &Value) -> Result<T, Error> {
    T::deserialize(data).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: data.to_string(),
    })
}
