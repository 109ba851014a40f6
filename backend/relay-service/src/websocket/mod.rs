/// WebSocket transport for the relay
///
/// Architecture:
/// 1. `session::WsSession`: one actor per socket, drives the connection state machine
/// 2. `messages`: JSON frames exchanged with the client
pub mod messages;
pub mod session;

pub use messages::{ClientMessage, WebSocketMessage};
pub use session::WsSession;
