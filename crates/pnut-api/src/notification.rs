//! App-stream notification normalization.
//!
//! Turns raw app-stream frames into a canonical [`Notification`] for
//! the four user-facing event kinds: repost, mention, bookmark, and
//! follow. Everything else — deletions, unknown event types, payloads
//! missing any required field — maps to `None`. Suppression is a
//! filter here, never an error: a malformed frame is simply not a
//! notification.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Post, StreamEnvelope, User};

// ── Notification ─────────────────────────────────────────────────────

/// The kind of user-facing event a notification describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Repost,
    Mention,
    /// Bookmarks surface as "favorited" in the message text.
    Bookmark,
    Follow,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            Self::Repost => "repost",
            Self::Mention => "mention",
            Self::Bookmark => "bookmark",
            Self::Follow => "follow",
        };
        f.write_str(tag)
    }
}

/// Canonical, fully-populated representation of a push notification.
///
/// Only ever constructed whole: if any field a full notification needs
/// is missing from the source payload, normalization yields `None`
/// rather than a partial value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    /// Human-readable message, ready for display or push delivery.
    pub message: String,
    /// Ids of the users this notification is addressed to, in payload
    /// order. Never empty.
    pub user_ids: Vec<String>,
    /// Id of the originating object — a post id, or the follower's
    /// user id for follows.
    pub object_id: String,
}

impl Notification {
    /// Normalize a decoded app-stream frame.
    ///
    /// Returns `None` for deletions, unrecognized event types, and
    /// payloads missing any required field.
    pub fn from_app_stream(envelope: &StreamEnvelope) -> Option<Self> {
        let meta = envelope.meta.as_ref()?;

        if meta.is_deleted == Some(true) {
            return None;
        }

        // `post` events carry their payload under `post`; the rest
        // under `data`.
        match meta.event_type.as_deref()? {
            "post" => post_notification(envelope.post.as_ref()?),
            "bookmark" => bookmark_notification(envelope.data.as_ref()?),
            "follow" => follow_notification(envelope.data.as_ref()?),
            _ => None,
        }
    }

    /// Normalize a raw JSON frame, decoding the envelope first.
    ///
    /// Frames that do not decode as an app-stream envelope yield
    /// `None`, like every other malformed payload.
    pub fn from_value(value: &Value) -> Option<Self> {
        let envelope = StreamEnvelope::deserialize(value).ok()?;
        Self::from_app_stream(&envelope)
    }
}

// ── Per-kind handlers ────────────────────────────────────────────────

/// `post`-type events produce a repost notification when the post is a
/// repost, otherwise a mention notification.
fn post_notification(post: &Post) -> Option<Notification> {
    if let Some(original) = post.repost_of.as_deref() {
        return repost_notification(post, original);
    }
    mention_notification(post)
}

/// Notify the author of the original post that it was reposted.
fn repost_notification(post: &Post, original: &Post) -> Option<Notification> {
    let reposter = post.user.as_ref()?.username.as_deref()?;
    let text = original.content.as_ref()?.text.as_deref()?;

    Some(Notification {
        kind: NotificationKind::Repost,
        message: format!("@{reposter} reposted: {text}"),
        user_ids: vec![original.user.as_ref()?.id.clone()?],
        object_id: post.id.clone()?,
    })
}

/// Notify every user mentioned in the post.
fn mention_notification(post: &Post) -> Option<Notification> {
    let content = post.content.as_ref()?;
    let mentions = &content.entities.as_ref()?.mentions;

    // Mentions without an id are skipped; a list that yields no ids at
    // all produces nothing.
    let user_ids: Vec<String> = mentions
        .iter()
        .filter_map(|mention| mention.id.clone())
        .collect();
    if user_ids.is_empty() {
        return None;
    }

    let author = post.user.as_ref()?.username.as_deref()?;
    let text = content.text.as_deref()?;

    Some(Notification {
        kind: NotificationKind::Mention,
        message: format!("@{author} mentioned you: {text}"),
        user_ids,
        object_id: post.id.clone()?,
    })
}

/// Bookmark payload: `data = {user, post}`.
#[derive(Debug, Deserialize)]
struct BookmarkData {
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    post: Option<Post>,
}

/// Notify the author of the bookmarked post.
fn bookmark_notification(data: &Value) -> Option<Notification> {
    let data = BookmarkData::deserialize(data).ok()?;
    let user = data.user?;
    let post = data.post?;

    let who = user.username.as_deref()?;
    let text = post.content.as_ref()?.text.as_deref()?;

    Some(Notification {
        kind: NotificationKind::Bookmark,
        message: format!("@{who} favorited: {text}"),
        user_ids: vec![post.user.as_ref()?.id.clone()?],
        object_id: user.id.clone()?,
    })
}

/// Follow payload: `data = {user, followed_user}`.
#[derive(Debug, Deserialize)]
struct FollowData {
    #[serde(default)]
    user: Option<User>,
    #[serde(default)]
    followed_user: Option<User>,
}

/// Notify the followed user about their new follower.
fn follow_notification(data: &Value) -> Option<Notification> {
    let data = FollowData::deserialize(data).ok()?;
    let follower = data.user?;
    let followed = data.followed_user?;

    let username = follower.username.as_deref()?;
    let display = display_name(&follower, username);

    Some(Notification {
        kind: NotificationKind::Follow,
        message: format!("{display} started following you"),
        user_ids: vec![followed.id.clone()?],
        object_id: follower.id.clone()?,
    })
}

/// `"Name (@handle)"` when a real display name is set, `"@handle"` when
/// the name is unset, empty, or the API's single-space placeholder.
fn display_name(user: &User, username: &str) -> String {
    match user.name.as_deref() {
        Some(name) if !name.is_empty() && name != " " => format!("{name} (@{username})"),
        _ => format!("@{username}"),
    }
}

// ── Tests ────────────────────────────────────────────────────────────
