// API response types.
//
// Models for the pnut.io JSON API. Every REST response arrives in a
// `{meta, data}` envelope; app-stream frames use the same shape except
// that `post`-type events nest their payload under `post` instead of
// `data`. Fields lean on `#[serde(default)]` because payload shape
// varies by event kind and API version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Envelope metadata ────────────────────────────────────────────────

/// Protocol metadata from the `{meta, data}` envelope.
///
/// `code` mirrors the HTTP status. On failure paths the server sets
/// `error_message` and the request layer turns the pair into
/// [`Error::Api`](crate::Error::Api), so a `Meta` observed by callers
/// always describes a success.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Meta {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Everything else the server sends (`more`, `min_id`, `max_id`, …).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Streams ──────────────────────────────────────────────────────────

/// Server-side long-poll subscription resource.
///
/// Identified by the app-chosen `key`; `object_types` names the event
/// categories the stream subscribes to, in subscription order. All
/// other fields are server-assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stream {
    pub key: String,
    #[serde(default)]
    pub object_types: Vec<String>,
    /// Server-assigned stream id.
    #[serde(default)]
    pub id: Option<String>,
    /// Delivery mechanism; this client only ever creates `"long_poll"`.
    #[serde(rename = "type", default)]
    pub stream_type: Option<String>,
    /// Endpoint to poll for this stream, when the server returns one.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── Users and posts ──────────────────────────────────────────────────

/// User object as embedded in posts and app-stream payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    /// Display name. The API reports a single space for unset names.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Post content: rendered text plus parsed entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub entities: Option<Entities>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Entities parsed out of post text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub mentions: Vec<Mention>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single mention entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mention {
    /// Id of the mentioned user.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub pos: Option<u32>,
    #[serde(default)]
    pub len: Option<u32>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Post object, as delivered by `post`-type app-stream events.
///
/// `repost_of` carries the original post when this one is a repost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub repost_of: Option<Box<Post>>,
    #[serde(default)]
    pub is_deleted: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ── App-stream envelope ──────────────────────────────────────────────

/// Raw frame envelope from the app-stream WebSocket.
///
/// Most event types carry their payload under `data`; `post`-type
/// events nest it under `post` instead. That asymmetry is the API's,
/// preserved here.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamEnvelope {
    #[serde(default)]
    pub meta: Option<StreamMeta>,
    /// Payload for `bookmark`, `follow`, and other `data`-keyed events.
    #[serde(default)]
    pub data: Option<Value>,
    /// Payload for `post`-type events.
    #[serde(default)]
    pub post: Option<Post>,
}

/// Metadata attached to an app-stream frame.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamMeta {
    /// Event kind tag: `"post"`, `"bookmark"`, `"follow"`, …
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    /// Set on deletion events, which never produce notifications.
    #[serde(default)]
    pub is_deleted: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
