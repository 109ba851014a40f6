/// HTTP and WebSocket entry points of the relay service
pub mod events;
pub mod presence;
pub mod websocket;

use actix_web::web;

pub use events::publish_event;
pub use presence::{online_users, user_presence};
pub use websocket::ws_handler;

pub fn register_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(ws_handler)).service(
        web::scope("/api/v1")
            .route("/events", web::post().to(publish_event))
            .route("/presence/online", web::get().to(online_users))
            .route("/presence/{user_id}", web::get().to(user_presence)),
    );
}
