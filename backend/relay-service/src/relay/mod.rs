/// Event relay
///
/// [`RelayHub`] is the single owner of the presence registry. Every register,
/// unregister, lookup and delivery is a message to the hub, so they are applied
/// one at a time in arrival order. [`RelayHandle`] is the cloneable front end the
/// rest of the service talks to.
pub mod handle;
pub mod hub;

pub use handle::RelayHandle;
pub use hub::{
    Deliver, GetOnlineUsers, GetStats, HubOptions, Lookup, Register, RelayHub, RelayStats,
    Shutdown, Unregister,
};

/// Result of a single delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Queued on the target's connection
    Delivered,
    /// No connection registered for the target; event dropped
    TargetOffline,
    /// Registered connection is already dead; event dropped, cleanup is left
    /// to that connection's disconnect
    ConnectionClosed,
}

impl DeliveryOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Delivered => "delivered",
            DeliveryOutcome::TargetOffline => "target_offline",
            DeliveryOutcome::ConnectionClosed => "connection_closed",
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}
