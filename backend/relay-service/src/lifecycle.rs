//! Connection lifecycle
//!
//! ```text
//! Connecting --verify ok--> Authenticated --registered--> Active --> Closed
//!      \--verify failed / channel gone------------------------------^
//! ```
//!
//! Only an `Active` connection owns a presence entry, so only closing from
//! `Active` owes the registry an unregister.

use event_schema::UserId;
use std::sync::Arc;

use crate::error::{IdentityError, RelayError};
use crate::identity::IdentityVerifier;
use crate::metrics;
use crate::presence::{ConnectionHandle, ConnectionId};
use crate::relay::RelayHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionPhase {
    Connecting,
    Authenticated(UserId),
    Active(UserId),
    Closed,
}

impl ConnectionPhase {
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            ConnectionPhase::Authenticated(id) | ConnectionPhase::Active(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_connecting(&self) -> bool {
        matches!(self, ConnectionPhase::Connecting)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, ConnectionPhase::Active(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionPhase::Closed)
    }

    /// `Connecting -> Authenticated`
    pub fn authenticated(&self, user_id: UserId) -> Option<Self> {
        match self {
            ConnectionPhase::Connecting => Some(ConnectionPhase::Authenticated(user_id)),
            _ => None,
        }
    }

    /// `Authenticated -> Active`
    pub fn activated(&self) -> Option<Self> {
        match self {
            ConnectionPhase::Authenticated(id) => Some(ConnectionPhase::Active(id.clone())),
            _ => None,
        }
    }

    /// Move to `Closed`, returning the user whose presence entry must be released
    pub fn close(&mut self) -> Option<UserId> {
        match std::mem::replace(self, ConnectionPhase::Closed) {
            ConnectionPhase::Active(id) => Some(id),
            _ => None,
        }
    }
}

/// Authenticates connections and keeps the registry in step with them
pub struct ConnectionLifecycle {
    verifier: Arc<dyn IdentityVerifier>,
    relay: RelayHandle,
}

impl ConnectionLifecycle {
    pub fn new(verifier: Arc<dyn IdentityVerifier>, relay: RelayHandle) -> Self {
        Self { verifier, relay }
    }

    pub fn relay(&self) -> &RelayHandle {
        &self.relay
    }

    /// Resolve the credential to a user; touches no registry state
    pub async fn authenticate(&self, credential: Option<&str>) -> Result<UserId, RelayError> {
        let credential = credential
            .filter(|c| !c.trim().is_empty())
            .ok_or(RelayError::AuthenticationFailed(IdentityError::Missing))?;

        self.verifier
            .verify_identity(credential)
            .await
            .map_err(RelayError::AuthenticationFailed)
    }

    /// Register an authenticated connection, unless its channel already closed
    pub fn activate(&self, user_id: UserId, handle: &ConnectionHandle) -> Result<(), RelayError> {
        if handle.is_closed() {
            metrics::record_connection("abandoned");
            tracing::debug!(
                user_id = %user_id,
                connection_id = %handle.id(),
                "connection closed before activation"
            );
            return Err(RelayError::ChannelClosed);
        }

        // Counted as accepted by the hub once the entry is stored
        self.relay.register(user_id, handle.clone());
        Ok(())
    }

    /// Authenticate, then register
    ///
    /// On any error nothing was registered and the caller should close the channel.
    pub async fn on_connect(
        &self,
        credential: Option<&str>,
        handle: &ConnectionHandle,
    ) -> Result<UserId, RelayError> {
        let user_id = match self.authenticate(credential).await {
            Ok(user_id) => user_id,
            Err(e) => {
                metrics::record_connection("rejected");
                let reason = match &e {
                    RelayError::AuthenticationFailed(reason) => reason.code(),
                    _ => "unknown",
                };
                tracing::info!(
                    connection_id = %handle.id(),
                    reason,
                    error = %e,
                    "connection rejected"
                );
                return Err(e);
            }
        };

        // Verification may have outlived the channel
        self.activate(user_id.clone(), handle)?;
        Ok(user_id)
    }

    pub fn on_disconnect(&self, user_id: UserId, connection_id: ConnectionId) {
        tracing::debug!(
            user_id = %user_id,
            connection_id = %connection_id,
            "connection closed"
        );
        self.relay.unregister(user_id, connection_id);
    }
}
