/// Event schema for the real-time relay
///
/// Producers (post, comment, like and chat handlers) build an [`Event`] after they
/// have persisted their own state and hand it to the relay. The relay never stores
/// events; it pushes them to the target's live connection or drops them.
use serde::{Deserialize, Serialize};
use std::fmt;

// Typed notification payloads carried in `Event::data`
pub mod notification;

pub use notification::{CommentNotification, DirectMessage, PostReaction, UserSummary};

/// Current schema version of the relay wire format
pub const SCHEMA_VERSION: u32 = 1;

/// Opaque account identifier
///
/// Identifiers come from the document store, so no format is assumed beyond
/// "non-empty string".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Kind of transient event pushed to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Like,
    Dislike,
    Comment,
    Message,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Like => "like",
            EventKind::Dislike => "dislike",
            EventKind::Comment => "comment",
            EventKind::Message => "message",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged payload addressed to a single user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub target_user_id: UserId,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Event {
    pub fn new(kind: EventKind, target_user_id: UserId, data: serde_json::Value) -> Self {
        Self {
            kind,
            target_user_id,
            data,
        }
    }

    /// Build an event from any serializable payload
    pub fn with_payload(
        kind: EventKind,
        target_user_id: UserId,
        payload: &impl Serialize,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::new(kind, target_user_id, serde_json::to_value(payload)?))
    }

    /// Post owner notification for a like
    pub fn like(post_owner: UserId, reaction: &PostReaction) -> Result<Self, serde_json::Error> {
        Self::with_payload(EventKind::Like, post_owner, reaction)
    }

    /// Post owner notification for a removed like
    pub fn dislike(post_owner: UserId, reaction: &PostReaction) -> Result<Self, serde_json::Error> {
        Self::with_payload(EventKind::Dislike, post_owner, reaction)
    }

    pub fn comment(
        post_owner: UserId,
        comment: &CommentNotification,
    ) -> Result<Self, serde_json::Error> {
        Self::with_payload(EventKind::Comment, post_owner, comment)
    }

    pub fn message(receiver: UserId, message: &DirectMessage) -> Result<Self, serde_json::Error> {
        Self::with_payload(EventKind::Message, receiver, message)
    }
}
