use actix_web::{web, App, HttpServer};
use relay_service::{
    handlers, logging, metrics, AppError, AppState, Config, HubOptions, JwtIdentityVerifier,
    RelayHandle,
};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    logging::init_tracing();

    let config = Config::from_env()?;
    tracing::info!(
        addr = %config.bind_addr(),
        reconnect_policy = ?config.reconnect_policy,
        "Starting relay service"
    );

    let verifier = Arc::new(JwtIdentityVerifier::from_config(&config)?);
    let relay = RelayHandle::start(HubOptions::from_config(&config));
    let state = AppState::new(config, verifier, relay.clone());
    let addr = state.config.bind_addr();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(metrics::MetricsMiddleware)
            .wrap(TracingLogger::default())
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(handlers::register_routes)
    })
    .bind(&addr)
    .map_err(|e| AppError::StartServer(format!("bind {addr}: {e}")))?
    .run();

    let result = server
        .await
        .map_err(|e| AppError::StartServer(e.to_string()));

    relay.shutdown();
    tracing::info!("Relay service stopped");
    result
}
