use std::sync::Arc;

use crate::config::Config;
use crate::identity::IdentityVerifier;
use crate::lifecycle::ConnectionLifecycle;
use crate::relay::RelayHandle;

/// Shared per-worker application state
#[derive(Clone)]
pub struct AppState {
    pub relay: RelayHandle,
    pub lifecycle: Arc<ConnectionLifecycle>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, verifier: Arc<dyn IdentityVerifier>, relay: RelayHandle) -> Self {
        Self {
            lifecycle: Arc::new(ConnectionLifecycle::new(verifier, relay.clone())),
            relay,
            config: Arc::new(config),
        }
    }
}
