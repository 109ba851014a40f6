/// WebSocket frame types for the relay
use event_schema::{Event, UserId, SCHEMA_VERSION};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Frames pushed from server to client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WebSocketMessage {
    /// Authentication succeeded and the connection is live
    Connected {
        connection_id: Uuid,
        user_id: UserId,
        /// Wire format version of relayed events
        schema_version: u32,
        timestamp: i64,
    },

    /// A relayed event (like, comment, message)
    Event(Event),

    /// Users with a live connection
    OnlineUsers { users: Vec<UserId> },

    /// A newer connection for the same user took over
    SessionReplaced { timestamp: i64 },

    Ping { timestamp: i64 },

    Pong { timestamp: i64 },

    Error { code: String, message: String },
}

impl WebSocketMessage {
    pub fn connected(connection_id: Uuid, user_id: UserId) -> Self {
        WebSocketMessage::Connected {
            connection_id,
            user_id,
            schema_version: SCHEMA_VERSION,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn online_users(users: Vec<UserId>) -> Self {
        WebSocketMessage::OnlineUsers { users }
    }

    pub fn session_replaced() -> Self {
        WebSocketMessage::SessionReplaced {
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn ping() -> Self {
        WebSocketMessage::Ping {
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn pong(timestamp: i64) -> Self {
        WebSocketMessage::Pong { timestamp }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        WebSocketMessage::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl From<Event> for WebSocketMessage {
    fn from(event: Event) -> Self {
        WebSocketMessage::Event(event)
    }
}

/// Frames accepted from the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping {
        #[serde(default)]
        timestamp: i64,
    },
    Pong {
        #[serde(default)]
        timestamp: i64,
    },
    GetOnlineUsers,
    /// Explicit logout; the server closes the socket
    Logout,
}

impl ClientMessage {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
