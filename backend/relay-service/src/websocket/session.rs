use actix::{
    Actor, ActorContext, ActorFutureExt, AsyncContext, Running, StreamHandler, WrapFuture,
};
use actix_web_actors::ws::{self, CloseCode, CloseReason};
use event_schema::UserId;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{ClientMessage, WebSocketMessage};
use crate::config::Config;
use crate::error::RelayError;
use crate::lifecycle::{ConnectionLifecycle, ConnectionPhase};
use crate::metrics;
use crate::presence::ConnectionHandle;

/// Timing knobs for one session
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub heartbeat_interval: Duration,
    pub client_timeout: Duration,
    pub auth_timeout: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            heartbeat_interval: config.heartbeat_interval(),
            client_timeout: config.client_timeout(),
            auth_timeout: config.auth_timeout(),
        }
    }
}

/// One client socket
///
/// The session starts in `Connecting` and verifies its credential without
/// blocking the socket. Only once verification has succeeded, and the session is
/// still alive, is it registered with the relay and switched to `Active`.
pub struct WsSession {
    handle: ConnectionHandle,
    outbound: Option<UnboundedReceiver<WebSocketMessage>>,
    credential: Option<String>,
    phase: ConnectionPhase,
    lifecycle: Arc<ConnectionLifecycle>,
    settings: SessionSettings,
    hb: Instant,
}

impl WsSession {
    pub fn new(
        lifecycle: Arc<ConnectionLifecycle>,
        credential: Option<String>,
        settings: SessionSettings,
    ) -> Self {
        let (handle, outbound) = ConnectionHandle::channel();
        Self {
            handle,
            outbound: Some(outbound),
            credential,
            phase: ConnectionPhase::Connecting,
            lifecycle,
            settings,
            hb: Instant::now(),
        }
    }

    fn hb(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let timeout = self.settings.client_timeout;
        ctx.run_interval(self.settings.heartbeat_interval, move |act, ctx| {
            if Instant::now().duration_since(act.hb) > timeout {
                tracing::warn!(
                    connection_id = %act.handle.id(),
                    "WebSocket heartbeat failed, disconnecting"
                );
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn start_authentication(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let lifecycle = self.lifecycle.clone();
        let credential = self.credential.clone();
        let handle = self.handle.clone();

        ctx.spawn(
            async move { lifecycle.on_connect(credential.as_deref(), &handle).await }
                .into_actor(self)
                .map(|result, act, ctx| act.on_connect_result(result, ctx)),
        );

        ctx.run_later(self.settings.auth_timeout, |act, ctx| {
            if act.phase.is_connecting() {
                metrics::record_connection("rejected");
                act.reject("AUTHENTICATION_TIMEOUT", "authentication timed out", ctx);
            }
        });
    }

    fn on_connect_result(
        &mut self,
        result: Result<UserId, RelayError>,
        ctx: &mut ws::WebsocketContext<Self>,
    ) {
        match result {
            Ok(user_id) if self.phase.is_connecting() && ctx.state().alive() => {
                let activated = self
                    .phase
                    .authenticated(user_id.clone())
                    .and_then(|phase| phase.activated());
                if let Some(phase) = activated {
                    self.phase = phase;
                }
                tracing::info!(
                    user_id = %user_id,
                    connection_id = %self.handle.id(),
                    "WebSocket session active"
                );
                self.send_frame(
                    &WebSocketMessage::connected(self.handle.id().as_uuid(), user_id),
                    ctx,
                );
            }
            Ok(user_id) => {
                // Registered after this session already ended (timeout or close)
                self.lifecycle.on_disconnect(user_id, self.handle.id());
            }
            Err(RelayError::AuthenticationFailed(reason)) if self.phase.is_connecting() => {
                self.reject("AUTHENTICATION_FAILED", &reason.to_string(), ctx);
            }
            Err(e) => {
                tracing::debug!(
                    connection_id = %self.handle.id(),
                    error = %e,
                    "connection ended before activation"
                );
                ctx.stop();
            }
        }
    }

    /// `Connecting -> Closed`; nothing was registered
    fn reject(&mut self, code: &str, message: &str, ctx: &mut ws::WebsocketContext<Self>) {
        tracing::info!(
            connection_id = %self.handle.id(),
            code,
            reason = message,
            "WebSocket connection rejected"
        );
        self.phase = ConnectionPhase::Closed;
        self.send_frame(&WebSocketMessage::error(code, message), ctx);
        self.close(
            ctx,
            CloseReason {
                code: CloseCode::Policy,
                description: Some(message.to_string()),
            },
        );
    }

    fn close(&mut self, ctx: &mut ws::WebsocketContext<Self>, reason: CloseReason) {
        ctx.close(Some(reason));
        ctx.stop();
    }

    fn send_frame(&self, message: &WebSocketMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match message.to_json() {
            Ok(text) => ctx.text(text),
            Err(e) => tracing::error!(error = %e, "failed to encode WebSocket frame"),
        }
    }

    fn handle_client_message(&mut self, text: &str, ctx: &mut ws::WebsocketContext<Self>) {
        if !self.phase.is_active() {
            tracing::debug!(
                connection_id = %self.handle.id(),
                "ignoring client frame before activation"
            );
            return;
        }

        match ClientMessage::from_json(text) {
            Ok(ClientMessage::Ping { timestamp }) => {
                self.send_frame(&WebSocketMessage::pong(timestamp), ctx);
            }
            Ok(ClientMessage::Pong { .. }) => {
                self.hb = Instant::now();
            }
            Ok(ClientMessage::GetOnlineUsers) => {
                let relay = self.lifecycle.relay().clone();
                ctx.spawn(
                    async move { relay.online_users().await }
                        .into_actor(self)
                        .map(|users, act, ctx| {
                            act.send_frame(&WebSocketMessage::online_users(users), ctx);
                        }),
                );
            }
            Ok(ClientMessage::Logout) => {
                tracing::info!(connection_id = %self.handle.id(), "client logged out");
                self.close(
                    ctx,
                    CloseReason {
                        code: CloseCode::Normal,
                        description: Some("logout".to_string()),
                    },
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to parse WS message");
                self.send_frame(
                    &WebSocketMessage::error("INVALID_MESSAGE", e.to_string()),
                    ctx,
                );
            }
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::debug!(connection_id = %self.handle.id(), "WebSocket session started");

        if let Some(outbound) = self.outbound.take() {
            ctx.add_stream(UnboundedReceiverStream::new(outbound));
        }
        self.hb(ctx);
        self.start_authentication(ctx);
    }

    fn stopping(&mut self, _ctx: &mut Self::Context) -> Running {
        // Transport end, protocol error, logout and timeouts all pass through here
        if let Some(user_id) = self.phase.close() {
            self.lifecycle.on_disconnect(user_id, self.handle.id());
        }
        Running::Stop
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::debug!(connection_id = %self.handle.id(), "WebSocket session stopped");
    }
}

/// Messages queued for this connection by the relay hub
impl StreamHandler<WebSocketMessage> for WsSession {
    fn handle(&mut self, msg: WebSocketMessage, ctx: &mut Self::Context) {
        if self.phase.is_closed() {
            return;
        }

        match msg {
            WebSocketMessage::SessionReplaced { .. } => {
                self.send_frame(&msg, ctx);
                self.close(
                    ctx,
                    CloseReason {
                        code: CloseCode::Policy,
                        description: Some("session replaced".to_string()),
                    },
                );
            }
            other => self.send_frame(&other, ctx),
        }
    }

    fn finished(&mut self, _ctx: &mut Self::Context) {
        // The session holds a sender itself, so this only happens on teardown
    }
}

/// Frames from the client socket
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.hb = Instant::now();
                self.handle_client_message(&text, ctx);
            }
            Ok(ws::Message::Binary(_)) => {
                tracing::warn!("Binary WebSocket messages not supported");
                self.send_frame(
                    &WebSocketMessage::error("UNSUPPORTED", "binary frames are not supported"),
                    ctx,
                );
            }
            Ok(ws::Message::Close(reason)) => {
                tracing::debug!(?reason, "WebSocket close message received");
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                let err = RelayError::Transport(e.to_string());
                tracing::warn!(
                    connection_id = %self.handle.id(),
                    error = %err,
                    "WebSocket protocol error"
                );
                ctx.stop();
            }
        }
    }
}
