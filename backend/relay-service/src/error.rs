use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Reasons an identity check can fail
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("credential missing")]
    Missing,

    #[error("credential malformed")]
    Malformed,

    #[error("credential expired")]
    Expired,

    #[error("credential revoked")]
    Revoked,

    #[error("credential invalid: {0}")]
    Invalid(String),
}

impl IdentityError {
    pub fn code(&self) -> &'static str {
        match self {
            IdentityError::Missing => "missing",
            IdentityError::Malformed => "malformed",
            IdentityError::Expired => "expired",
            IdentityError::Revoked => "revoked",
            IdentityError::Invalid(_) => "invalid",
        }
    }
}

/// Failures inside the relay core
///
/// An offline target is not an error: see [`crate::relay::DeliveryOutcome`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(#[from] IdentityError),

    /// The client channel went away before the operation completed
    #[error("connection channel closed")]
    ChannelClosed,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Service-level errors surfaced through HTTP
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server start failure: {0}")]
    StartServer(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl AppError {
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::BadRequest(_) => 400,
            AppError::Unauthorized => 401,
            AppError::Config(_) | AppError::StartServer(_) => 500,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::StartServer(_) => "START_FAILURE",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized => "UNAUTHORIZED",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(AppError::status_code(self))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_response(&self) -> HttpResponse {
        // Internal details stay in the logs
        let message = match self {
            AppError::Config(_) | AppError::StartServer(_) => {
                tracing::error!(error = %self, "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(ResponseError::status_code(self)).json(json!({
            "error": message,
            "code": self.code(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::BadRequest("x".into()).status_code(), 400);
        assert_eq!(AppError::Unauthorized.status_code(), 401);
        assert_eq!(AppError::Config("x".into()).status_code(), 500);
    }

    #[test]
    fn test_internal_details_hidden() {
        let resp = AppError::Config("RELAY_JWT_SECRET=hunter2".into()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_identity_error_codes() {
        assert_eq!(IdentityError::Expired.code(), "expired");
        assert_eq!(IdentityError::Invalid("sig".into()).code(), "invalid");
        assert_eq!(
            RelayError::from(IdentityError::Revoked).to_string(),
            "authentication failed: credential revoked"
        );
        assert_eq!(
            RelayError::Transport("reset".into()).to_string(),
            "transport error: reset"
        );
    }
}
