/// Producer endpoint for events
use actix_web::{web, HttpResponse};
use event_schema::{Event, UserId};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// An event plus the user who caused it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishEventRequest {
    #[serde(flatten)]
    pub event: Event,
    #[serde(default)]
    pub actor_id: Option<UserId>,
}

impl PublishEventRequest {
    /// Users are not notified about their own actions
    pub fn is_self_notification(&self) -> bool {
        self.actor_id.as_ref() == Some(&self.event.target_user_id)
    }
}

/// Hand an event to the relay
///
/// POST /api/v1/events
///
/// Answers 202 as soon as the event is queued; delivery is best effort.
pub async fn publish_event(
    state: web::Data<AppState>,
    req: web::Json<PublishEventRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();

    if req.event.target_user_id.is_empty() {
        return Err(AppError::BadRequest("target_user_id is required".to_string()));
    }

    if req.is_self_notification() {
        tracing::debug!(
            user_id = %req.event.target_user_id,
            kind = %req.event.kind,
            "skipping self notification"
        );
        return Ok(HttpResponse::Accepted().json(json!({
            "status": "skipped",
            "reason": "self_notification"
        })));
    }

    let kind = req.event.kind;
    let target = req.event.target_user_id.clone();
    state.relay.deliver(target.clone(), req.event);

    Ok(HttpResponse::Accepted().json(json!({
        "status": "accepted",
        "kind": kind,
        "target_user_id": target
    })))
}
