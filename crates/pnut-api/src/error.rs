use thiserror::Error;

/// Top-level error type for the `pnut-api` crate.
///
/// Covers every failure mode across all API surfaces: parameter
/// validation, app authentication, HTTP transport, the `{meta, data}`
/// envelope, and the app-stream WebSocket. Validation errors are
/// reported before any network I/O happens; everything else is surfaced
/// to the caller unchanged — this crate performs no retries.
#[derive(Debug, Error)]
pub enum Error {
    // ── Caller misuse (detected before any I/O) ─────────────────────
    /// A required request parameter was not supplied.
    ///
    /// `key` names the first missing field.
    #[error("Invalid parameters: must provide \"{key}\" value")]
    InvalidParameters { key: &'static str },

    /// Client credentials are missing or empty.
    #[error("Invalid configuration: must supply both a client id and client secret")]
    InvalidConfiguration,

    /// An authenticated operation was attempted without a bearer token.
    #[error("No app access token held -- call authenticate() first")]
    Unauthenticated,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── API ─────────────────────────────────────────────────────────
    /// Server-reported failure from the `{meta: {error_message, code}}`
    /// envelope. `code` mirrors the HTTP status and is 0 when the
    /// server omitted it.
    #[error("API error (code {code}): {message}")]
    Api { message: String, code: u16 },

    /// The token endpoint answered without an `access_token`, even
    /// though the HTTP call itself succeeded.
    #[error("Response did not include an access token")]
    MissingToken,

    // ── Data ────────────────────────────────────────────────────────
    /// JSON encoding or decoding failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// App-stream WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),
}

impl Error {
    /// Returns `true` if this is the server's "not found" envelope.
    ///
    /// `retrieve_or_create_stream` branches on this: only an API-level
    /// 404 triggers a create, every other failure is surfaced unchanged.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { code: 404, .. })
    }

    /// Extract the numeric API error code, if the server reported one.
    pub fn api_code(&self) -> Option<u16> {
        if let Self::Api { code, .. } = self {
            Some(*code)
        } else {
            None
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
