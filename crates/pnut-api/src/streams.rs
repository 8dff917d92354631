// Stream resource operations.
//
// pnut.io "streams" are server-side long-poll subscriptions keyed by an
// app-chosen string. The client holds no stream state of its own; every
// operation is a fresh round trip and the server's answer is canonical.
// Required parameters are checked before any network call, reporting
// the first missing field.

use tracing::debug;

use crate::client::Client;
use crate::error::Error;
use crate::models::{Meta, Stream};

// ── Parameters ───────────────────────────────────────────────────────

/// Parameters for stream operations.
///
/// `key` is required by every operation; `object_types` additionally by
/// create and update. `object_types` order is preserved end to end.
#[derive(Debug, Clone, Default)]
pub struct StreamParams {
    pub key: Option<String>,
    pub object_types: Option<Vec<String>>,
}

impl StreamParams {
    /// Parameters with only the stream key set.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            object_types: None,
        }
    }

    /// Set the object types the stream subscribes to.
    #[must_use]
    pub fn with_object_types<I, S>(mut self, object_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.object_types = Some(object_types.into_iter().map(Into::into).collect());
        self
    }

    fn require_key(&self) -> Result<&str, Error> {
        self.key
            .as_deref()
            .ok_or(Error::InvalidParameters { key: "key" })
    }

    fn require_object_types(&self) -> Result<&[String], Error> {
        self.object_types
            .as_deref()
            .ok_or(Error::InvalidParameters { key: "object_types" })
    }
}

// ── Operations ───────────────────────────────────────────────────────

impl Client {
    /// Retrieve the stream with the given key.
    ///
    /// `GET /streams/{key}`
    pub async fn retrieve_stream(&self, params: &StreamParams) -> Result<(Meta, Stream), Error> {
        let key = params.require_key()?;
        debug!(key, "retrieving stream");
        self.get(format!("/streams/{key}")).await
    }

    /// Remove the stream with the given key.
    ///
    /// `DELETE /streams/{key}` — the response carries the final state
    /// of the removed stream.
    pub async fn remove_stream(&self, params: &StreamParams) -> Result<(Meta, Stream), Error> {
        let key = params.require_key()?;
        debug!(key, "removing stream");
        self.delete(format!("/streams/{key}")).await
    }

    /// Create a long-poll stream for the given key and object types.
    ///
    /// `POST /streams`
    pub async fn create_stream(&self, params: &StreamParams) -> Result<(Meta, Stream), Error> {
        #[derive(serde::Serialize)]
        struct Body<'a> {
            #[serde(rename = "type")]
            stream_type: &'a str,
            key: &'a str,
            object_types: &'a [String],
        }

        let key = params.require_key()?;
        let object_types = params.require_object_types()?;

        debug!(key, "creating stream");
        self.post(
            "/streams".to_owned(),
            &Body {
                stream_type: "long_poll",
                key,
                object_types,
            },
        )
        .await
    }

    /// Replace the object types of an existing stream.
    ///
    /// `PUT /streams/{key}` — the body carries only `object_types`; the
    /// key travels in the path and the delivery type is immutable.
    pub async fn update_stream(&self, params: &StreamParams) -> Result<(Meta, Stream), Error> {
        #[derive(serde::Serialize)]
        struct Body<'a> {
            object_types: &'a [String],
        }

        let key = params.require_key()?;
        let object_types = params.require_object_types()?;

        debug!(key, "updating stream");
        self.put(format!("/streams/{key}"), &Body { object_types })
            .await
    }

    /// Retrieve the stream with the given key, creating it if the
    /// server says it does not exist.
    ///
    /// Only an API-level 404 triggers the create; any other failure is
    /// surfaced unchanged with no further calls. Read-then-create has
    /// no transactional guarantee: a concurrent creator or remover can
    /// win the race, and whatever the server answers is returned as-is.
    pub async fn retrieve_or_create_stream(
        &self,
        params: &StreamParams,
    ) -> Result<(Meta, Stream), Error> {
        match self.retrieve_stream(params).await {
            Ok(found) => Ok(found),
            Err(err) if err.is_not_found() => {
                debug!(key = ?params.key, "stream not found, creating");
                self.create_stream(params).await
            }
            Err(err) => Err(err),
        }
    }
}
