use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::UserId;

/// Public profile fragment attached to notifications so the client can render
/// them without another round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

/// Like / dislike on a post, addressed to the post owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostReaction {
    /// User who reacted
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_details: Option<UserSummary>,
    pub post_id: String,
    pub message: String,
}

impl PostReaction {
    pub fn liked(
        user_id: UserId,
        user_details: Option<UserSummary>,
        post_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            user_details,
            post_id: post_id.into(),
            message: "Your post was liked".to_string(),
        }
    }

    pub fn unliked(
        user_id: UserId,
        user_details: Option<UserSummary>,
        post_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            user_details,
            post_id: post_id.into(),
            message: "Your post was unliked".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNotification {
    /// Comment author
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_details: Option<UserSummary>,
    pub post_id: String,
    pub comment_id: String,
    pub text: String,
}

/// Direct message pushed to the receiver's chat view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMessage {
    pub message_id: Uuid,
    pub sender_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl DirectMessage {
    pub fn new(sender_id: UserId, text: impl Into<String>) -> Self {
        Self {
            message_id: Uuid::new_v4(),
            sender_id,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Event, EventKind};

    #[test]
    fn test_like_payload_uses_client_field_names() {
        let liker = UserSummary {
            id: UserId::new("u1"),
            username: "alice".to_string(),
            profile_picture: None,
        };
        let reaction = PostReaction::liked(UserId::new("u1"), Some(liker), "p42");
        let event = Event::like(UserId::new("u2"), &reaction).unwrap();

        assert_eq!(event.kind, EventKind::Like);
        assert_eq!(event.target_user_id, UserId::new("u2"));
        assert_eq!(event.data["userId"], "u1");
        assert_eq!(event.data["postId"], "p42");
        assert_eq!(event.data["userDetails"]["username"], "alice");
        assert_eq!(event.data["userDetails"]["_id"], "u1");
        assert!(event.data["userDetails"].get("profilePicture").is_none());
    }

    #[test]
    fn test_dislike_message_differs_from_like() {
        let like = PostReaction::liked(UserId::new("u1"), None, "p1");
        let dislike = PostReaction::unliked(UserId::new("u1"), None, "p1");
        assert_ne!(like.message, dislike.message);

        let event = Event::dislike(UserId::new("u2"), &dislike).unwrap();
        assert_eq!(event.kind, EventKind::Dislike);
        assert!(event.data.get("userDetails").is_none());
    }

    #[test]
    fn test_direct_message_payload() {
        let dm = DirectMessage::new(UserId::new("u3"), "hey");
        let event = Event::message(UserId::new("u4"), &dm).unwrap();

        assert_eq!(event.data["senderId"], "u3");
        assert_eq!(event.data["text"], "hey");
        assert!(event.data["createdAt"].is_string());

        let decoded: DirectMessage = serde_json::from_value(event.data).unwrap();
        assert_eq!(decoded, dm);
    }
}
