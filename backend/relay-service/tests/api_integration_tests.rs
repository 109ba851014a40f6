/// Integration tests for the relay-service HTTP API
///
/// Covers:
/// - event publishing (accepted, skipped, rejected)
/// - presence queries
/// - refusal of WebSocket upgrades without a credential
use actix_web::{test, web, App};
use event_schema::{Event, UserId};
use relay_service::{
    handlers, metrics, AppState, Config, ConnectionHandle, HubOptions, JwtIdentityVerifier,
    RelayHandle, WebSocketMessage,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn test_state() -> (AppState, RelayHandle) {
    let config = Config::from_iter(vec![(
        "RELAY_JWT_SECRET".to_string(),
        "test-secret".to_string(),
    )])
    .unwrap();
    let relay = RelayHandle::start(HubOptions::default());
    let verifier = Arc::new(JwtIdentityVerifier::hs256("test-secret"));
    (AppState::new(config, verifier, relay.clone()), relay)
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .wrap(metrics::MetricsMiddleware)
                .route("/health", web::get().to(|| async { "OK" }))
                .configure(handlers::register_routes),
        )
        .await
    };
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<WebSocketMessage>) -> Vec<WebSocketMessage> {
    let mut frames = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        frames.push(frame);
    }
    frames
}

#[actix_rt::test]
async fn test_health() {
    let (state, _relay) = test_state();
    let app = test_app!(state);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, "OK");
}

#[actix_rt::test]
async fn test_publish_to_offline_user_is_accepted() {
    let (state, relay) = test_state();
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .set_json(json!({"kind": "like", "target_user_id": "nobody", "actor_id": "fan"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 202);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["kind"], "like");

    // offline targets are not registered as a side effect
    assert!(!relay.is_online(&UserId::from("nobody")).await);
}

#[actix_rt::test]
async fn test_publish_delivers_to_online_user() {
    let (state, relay) = test_state();
    let app = test_app!(state);

    let owner = UserId::from("owner");
    let (handle, mut rx) = ConnectionHandle::channel();
    assert!(relay.register_confirmed(owner.clone(), handle).await);

    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .set_json(json!({
            "kind": "like",
            "target_user_id": "owner",
            "actor_id": "fan",
            "data": {"userId": "fan", "postId": "p1", "message": "Your post was liked"}
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 202);

    // mailbox barrier: the deliver above is processed before this query
    relay.stats().await;

    let events: Vec<Event> = drain(&mut rx)
        .into_iter()
        .filter_map(|frame| match frame {
            WebSocketMessage::Event(event) => Some(event),
            _ => None,
        })
        .collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].target_user_id, owner);
    assert_eq!(events[0].data["postId"], "p1");
}

#[actix_rt::test]
async fn test_self_notification_is_skipped() {
    let (state, relay) = test_state();
    let app = test_app!(state);

    let (handle, mut rx) = ConnectionHandle::channel();
    assert!(relay.register_confirmed(UserId::from("u1"), handle).await);
    drain(&mut rx);

    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .set_json(json!({"kind": "dislike", "target_user_id": "u1", "actor_id": "u1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 202);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "skipped");

    relay.stats().await;
    assert!(drain(&mut rx).is_empty());
}

#[actix_rt::test]
async fn test_publish_validation() {
    let (state, _relay) = test_state();
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .set_json(json!({"kind": "comment", "target_user_id": "  "}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "BAD_REQUEST");

    let req = test::TestRequest::post()
        .uri("/api/v1/events")
        .set_json(json!({"kind": "follow", "target_user_id": "u1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
async fn test_presence_endpoints() {
    let (state, relay) = test_state();
    let app = test_app!(state);

    let (handle_b, _rx_b) = ConnectionHandle::channel();
    let (handle_a, _rx_a) = ConnectionHandle::channel();
    assert!(relay.register_confirmed(UserId::from("bob"), handle_b).await);
    assert!(relay.register_confirmed(UserId::from("alice"), handle_a).await);

    let req = test::TestRequest::get()
        .uri("/api/v1/presence/online")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["users"], json!(["alice", "bob"]));

    let req = test::TestRequest::get()
        .uri("/api/v1/presence/alice")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"user_id": "alice", "online": true}));

    let req = test::TestRequest::get()
        .uri("/api/v1/presence/carol")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["online"], false);
}

#[actix_rt::test]
async fn test_ws_without_credential_is_unauthorized() {
    let (state, relay) = test_state();
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/ws")
        .insert_header(("connection", "upgrade"))
        .insert_header(("upgrade", "websocket"))
        .insert_header(("sec-websocket-version", "13"))
        .insert_header(("sec-websocket-key", "dGhlIHNhbXBsZSBub25jZQ=="))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert!(relay.online_users().await.is_empty());
}
