/// Read-only presence queries
use actix_web::{web, HttpResponse};
use event_schema::UserId;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// GET /api/v1/presence/online
pub async fn online_users(state: web::Data<AppState>) -> Result<HttpResponse> {
    let users = state.relay.online_users().await;

    Ok(HttpResponse::Ok().json(json!({
        "count": users.len(),
        "users": users
    })))
}

/// GET /api/v1/presence/{user_id}
pub async fn user_presence(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let user_id = UserId::new(path.into_inner());
    if user_id.is_empty() {
        return Err(AppError::BadRequest("user_id is required".to_string()));
    }

    let online = state.relay.is_online(&user_id).await;

    Ok(HttpResponse::Ok().json(json!({
        "user_id": user_id,
        "online": online
    })))
}
