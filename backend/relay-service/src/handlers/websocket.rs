/// WebSocket upgrade endpoint
///
/// GET /ws
///
/// The credential is read from the `token` cookie, then an
/// `Authorization: Bearer` header, then a `token` query parameter. A request
/// carrying none of them is refused before the upgrade; anything else is
/// verified inside the session.
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Deserialize;

use crate::error::AppError;
use crate::metrics;
use crate::state::AppState;
use crate::websocket::{session::SessionSettings, WsSession};

pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let Some(credential) = extract_credential(&req) else {
        tracing::info!(peer = ?req.peer_addr(), "WebSocket connection refused: no credential");
        metrics::record_connection("rejected");
        return Err(AppError::Unauthorized.into());
    };

    let session = WsSession::new(
        state.lifecycle.clone(),
        Some(credential),
        SessionSettings::from_config(&state.config),
    );

    ws::WsResponseBuilder::new(session, &req, stream)
        .frame_size(state.config.max_frame_size)
        .start()
}

/// First non-empty credential in cookie, header, query order
pub fn extract_credential(req: &HttpRequest) -> Option<String> {
    let from_cookie = req.cookie(TOKEN_COOKIE).map(|c| c.value().to_string());

    let from_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim().to_string());

    let from_query = web::Query::<TokenQuery>::from_query(req.query_string())
        .ok()
        .and_then(|q| q.into_inner().token);

    [from_cookie, from_header, from_query]
        .into_iter()
        .flatten()
        .find(|c| !c.trim().is_empty())
}
