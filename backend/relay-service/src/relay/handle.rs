use actix::{Actor, Addr};
use event_schema::{Event, UserId};

use super::hub::{
    Deliver, GetOnlineUsers, GetStats, HubOptions, Lookup, Register, RelayHub, RelayStats,
    Shutdown, Unregister,
};
use super::DeliveryOutcome;
use crate::presence::{ConnectionHandle, ConnectionId};

/// Cloneable front end of the relay hub
///
/// Fire-and-forget calls (`register`, `unregister`, `deliver`) enqueue on the hub
/// mailbox and return immediately. Queries await the hub's answer and fall back
/// to an empty result if the hub is gone.
#[derive(Clone)]
pub struct RelayHandle {
    hub: Addr<RelayHub>,
}

impl RelayHandle {
    /// Start a hub on the current arbiter
    pub fn start(options: HubOptions) -> Self {
        Self {
            hub: RelayHub::new(options).start(),
        }
    }

    pub fn register(&self, user_id: UserId, handle: ConnectionHandle) {
        self.hub.do_send(Register { user_id, handle });
    }

    pub fn unregister(&self, user_id: UserId, connection_id: ConnectionId) {
        self.hub.do_send(Unregister {
            user_id,
            connection_id,
        });
    }

    /// Register and wait for the hub to apply it; `false` if the handle was dead
    pub async fn register_confirmed(&self, user_id: UserId, handle: ConnectionHandle) -> bool {
        self.hub
            .send(Register { user_id, handle })
            .await
            .unwrap_or(false)
    }

    pub async fn lookup(&self, user_id: &UserId) -> Option<ConnectionHandle> {
        self.hub
            .send(Lookup {
                user_id: user_id.clone(),
            })
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "relay hub unavailable for lookup");
                None
            })
    }

    /// Best-effort, at-most-once delivery
    ///
    /// Never blocks and never reports back; an offline target simply gets nothing.
    pub fn deliver(&self, target_user_id: UserId, event: Event) {
        self.hub.do_send(Deliver {
            target_user_id,
            event,
        });
    }

    /// Same as [`deliver`](Self::deliver) but waits for the hub to report what happened
    pub async fn deliver_with_outcome(
        &self,
        target_user_id: UserId,
        event: Event,
    ) -> DeliveryOutcome {
        self.hub
            .send(Deliver {
                target_user_id,
                event,
            })
            .await
            .unwrap_or(DeliveryOutcome::TargetOffline)
    }

    pub async fn online_users(&self) -> Vec<UserId> {
        self.hub.send(GetOnlineUsers).await.unwrap_or_default()
    }

    pub async fn is_online(&self, user_id: &UserId) -> bool {
        self.lookup(user_id).await.is_some()
    }

    pub async fn stats(&self) -> RelayStats {
        self.hub.send(GetStats).await.unwrap_or_default()
    }

    pub fn shutdown(&self) {
        self.hub.do_send(Shutdown);
    }
}
