pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod lifecycle;
pub mod logging;
pub mod metrics;
pub mod presence;
pub mod relay;
pub mod state;
pub mod websocket;

pub use config::{Config, ReconnectPolicy};
pub use error::{AppError, IdentityError, RelayError, Result};
pub use identity::{IdentityVerifier, JwtIdentityVerifier};
pub use lifecycle::{ConnectionLifecycle, ConnectionPhase};
pub use presence::{ConnectionHandle, ConnectionId, PresenceRegistry};
pub use relay::{DeliveryOutcome, HubOptions, RelayHandle};
pub use state::AppState;
pub use websocket::{ClientMessage, WebSocketMessage, WsSession};
