use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::AppError;

/// Prefix shared by every relay environment variable
pub const ENV_PREFIX: &str = "RELAY_";

/// What happens to an older session when the same user connects again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReconnectPolicy {
    /// The older socket stays open but no longer receives events
    #[default]
    KeepPrevious,
    /// The older socket is told it was replaced and closed
    ClosePrevious,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// HS256 shared secret
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// RS256 public key (PEM); wins over `jwt_secret` when both are set
    #[serde(default)]
    pub jwt_public_key_pem: Option<String>,
    /// `jti` values that must be refused
    #[serde(default)]
    pub revoked_token_ids: Vec<String>,
    #[serde(default = "default_heartbeat_interval_secs")]
    pub heartbeat_interval_secs: u64,
    #[serde(default = "default_client_timeout_secs")]
    pub client_timeout_secs: u64,
    #[serde(default = "default_auth_timeout_secs")]
    pub auth_timeout_secs: u64,
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,
    #[serde(default = "default_broadcast_presence")]
    pub broadcast_presence: bool,
    #[serde(default)]
    pub reconnect_policy: ReconnectPolicy,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8085
}

fn default_heartbeat_interval_secs() -> u64 {
    5
}

fn default_client_timeout_secs() -> u64 {
    30
}

fn default_auth_timeout_secs() -> u64 {
    10
}

fn default_max_frame_size() -> usize {
    256_000
}

fn default_broadcast_presence() -> bool {
    true
}

impl Config {
    /// Load from the process environment (and `.env` if present)
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let config: Config = envy::prefixed(ENV_PREFIX)
            .from_env()
            .map_err(|e| AppError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from explicit key/value pairs (keys carry the `RELAY_` prefix)
    pub fn from_iter<I>(vars: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Config = envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .map_err(|e| AppError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        let has_secret = self
            .jwt_secret
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        let has_public_key = self
            .jwt_public_key_pem
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        if !has_secret && !has_public_key {
            return Err(AppError::Config(
                "RELAY_JWT_SECRET or RELAY_JWT_PUBLIC_KEY_PEM must be set".into(),
            ));
        }

        if self.heartbeat_interval_secs == 0
            || self.client_timeout_secs == 0
            || self.auth_timeout_secs == 0
        {
            return Err(AppError::Config("timeouts must be greater than zero".into()));
        }

        if self.client_timeout_secs <= self.heartbeat_interval_secs {
            return Err(AppError::Config(
                "RELAY_CLIENT_TIMEOUT_SECS must exceed RELAY_HEARTBEAT_INTERVAL_SECS".into(),
            ));
        }

        if self.max_frame_size == 0 {
            return Err(AppError::Config("RELAY_MAX_FRAME_SIZE must be greater than zero".into()));
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout_secs)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }
}
