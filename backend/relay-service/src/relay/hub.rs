use actix::{Actor, ActorContext, Context, Handler, Message, MessageResult};
use event_schema::{Event, UserId};

use super::DeliveryOutcome;
use crate::config::{Config, ReconnectPolicy};
use crate::metrics;
use crate::presence::{ConnectionHandle, ConnectionId, PresenceRegistry};
use crate::websocket::WebSocketMessage;

#[derive(Debug, Clone, Copy)]
pub struct HubOptions {
    pub reconnect_policy: ReconnectPolicy,
    /// Push `online_users` to every connection when presence changes
    pub broadcast_presence: bool,
}

impl HubOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            reconnect_policy: config.reconnect_policy,
            broadcast_presence: config.broadcast_presence,
        }
    }
}

impl Default for HubOptions {
    fn default() -> Self {
        Self {
            reconnect_policy: ReconnectPolicy::KeepPrevious,
            broadcast_presence: true,
        }
    }
}

/// Owner of the presence registry
pub struct RelayHub {
    registry: PresenceRegistry,
    options: HubOptions,
}

impl RelayHub {
    pub fn new(options: HubOptions) -> Self {
        Self {
            registry: PresenceRegistry::new(),
            options,
        }
    }

    fn broadcast_online_users(&self) {
        if !self.options.broadcast_presence {
            return;
        }
        let users = self.registry.online_users();
        for handle in self.registry.handles() {
            // A dead handle is cleaned up by its own disconnect
            let _ = handle.send(WebSocketMessage::online_users(users.clone()));
        }
    }
}

impl Actor for RelayHub {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            reconnect_policy = ?self.options.reconnect_policy,
            broadcast_presence = self.options.broadcast_presence,
            "relay hub started"
        );
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(remaining = self.registry.len(), "relay hub stopped");
        self.registry.clear();
        metrics::set_active_connections(0);
    }
}

/// Record `user_id -> handle`
///
/// Resolves to `false` when the handle was already dead and nothing was stored.
#[derive(Message)]
#[rtype(result = "bool")]
pub struct Register {
    pub user_id: UserId,
    pub handle: ConnectionHandle,
}

impl Handler<Register> for RelayHub {
    type Result = MessageResult<Register>;

    fn handle(&mut self, msg: Register, _ctx: &mut Self::Context) -> Self::Result {
        if msg.handle.is_closed() {
            tracing::debug!(
                user_id = %msg.user_id,
                connection_id = %msg.handle.id(),
                "skipping registration of closed connection"
            );
            metrics::record_connection("abandoned");
            return MessageResult(false);
        }

        metrics::record_connection("accepted");

        let connection_id = msg.handle.id();
        let replaced = self.registry.register(msg.user_id.clone(), msg.handle);

        match replaced {
            Some(previous) => {
                tracing::info!(
                    user_id = %msg.user_id,
                    connection_id = %connection_id,
                    previous_connection_id = %previous.id(),
                    "presence entry replaced"
                );
                if self.options.reconnect_policy == ReconnectPolicy::ClosePrevious {
                    let _ = previous.send(WebSocketMessage::session_replaced());
                }
            }
            None => {
                tracing::debug!(
                    user_id = %msg.user_id,
                    connection_id = %connection_id,
                    "presence entry created"
                );
            }
        }

        metrics::set_active_connections(self.registry.len());
        self.broadcast_online_users();
        MessageResult(true)
    }
}

/// Remove `user_id` only while it still points at `connection_id`
#[derive(Message)]
#[rtype(result = "bool")]
pub struct Unregister {
    pub user_id: UserId,
    pub connection_id: ConnectionId,
}

impl Handler<Unregister> for RelayHub {
    type Result = MessageResult<Unregister>;

    fn handle(&mut self, msg: Unregister, _ctx: &mut Self::Context) -> Self::Result {
        let removed = self.registry.unregister(&msg.user_id, msg.connection_id);
        if removed {
            tracing::debug!(
                user_id = %msg.user_id,
                connection_id = %msg.connection_id,
                "presence entry removed"
            );
            metrics::set_active_connections(self.registry.len());
            self.broadcast_online_users();
        } else {
            tracing::debug!(
                user_id = %msg.user_id,
                connection_id = %msg.connection_id,
                "stale unregister ignored"
            );
        }
        MessageResult(removed)
    }
}

#[derive(Message)]
#[rtype(result = "Option<ConnectionHandle>")]
pub struct Lookup {
    pub user_id: UserId,
}

impl Handler<Lookup> for RelayHub {
    type Result = MessageResult<Lookup>;

    fn handle(&mut self, msg: Lookup, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.registry.lookup(&msg.user_id).cloned())
    }
}

/// Push `event` to the target's connection, or drop it
#[derive(Message)]
#[rtype(result = "DeliveryOutcome")]
pub struct Deliver {
    pub target_user_id: UserId,
    pub event: Event,
}

impl Handler<Deliver> for RelayHub {
    type Result = MessageResult<Deliver>;

    fn handle(&mut self, msg: Deliver, _ctx: &mut Self::Context) -> Self::Result {
        let kind = msg.event.kind;
        let outcome = match self.registry.lookup(&msg.target_user_id) {
            None => DeliveryOutcome::TargetOffline,
            Some(handle) => match handle.send(WebSocketMessage::Event(msg.event)) {
                Ok(()) => DeliveryOutcome::Delivered,
                Err(_) => DeliveryOutcome::ConnectionClosed,
            },
        };

        tracing::debug!(
            target_user_id = %msg.target_user_id,
            kind = %kind,
            outcome = outcome.as_str(),
            "event relayed"
        );
        metrics::record_event(kind.as_str(), outcome.as_str());

        MessageResult(outcome)
    }
}

#[derive(Message)]
#[rtype(result = "Vec<UserId>")]
pub struct GetOnlineUsers;

impl Handler<GetOnlineUsers> for RelayHub {
    type Result = MessageResult<GetOnlineUsers>;

    fn handle(&mut self, _msg: GetOnlineUsers, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.registry.online_users())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct RelayStats {
    pub connected_users: usize,
}

#[derive(Message)]
#[rtype(result = "RelayStats")]
pub struct GetStats;

impl Handler<GetStats> for RelayHub {
    type Result = MessageResult<GetStats>;

    fn handle(&mut self, _msg: GetStats, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(RelayStats {
            connected_users: self.registry.len(),
        })
    }
}

/// Tear down the registry and stop the hub
#[derive(Message)]
#[rtype(result = "()")]
pub struct Shutdown;

impl Handler<Shutdown> for RelayHub {
    type Result = ();

    fn handle(&mut self, _msg: Shutdown, ctx: &mut Self::Context) -> Self::Result {
        ctx.stop();
    }
}
