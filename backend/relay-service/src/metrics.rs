use std::time::Duration;

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, TextEncoder,
};

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "relay_service_http_requests_total",
            "Total HTTP requests handled by relay-service",
        ),
        &["method", "path", "status"],
    )
    .expect("failed to create relay_service_http_requests_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register relay_service_http_requests_total");
    counter
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new(
            "relay_service_http_request_duration_seconds",
            "HTTP request latency for relay-service",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["method", "path", "status"],
    )
    .expect("failed to create relay_service_http_request_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register relay_service_http_request_duration_seconds");
    histogram
});

static ACTIVE_CONNECTIONS: Lazy<IntGauge> = Lazy::new(|| {
    let gauge = IntGauge::new(
        "relay_active_connections",
        "Users with a registered live connection",
    )
    .expect("failed to create relay_active_connections");
    prometheus::default_registry()
        .register(Box::new(gauge.clone()))
        .expect("failed to register relay_active_connections");
    gauge
});

static CONNECTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "relay_connections_total",
            "WebSocket connection attempts by outcome",
        ),
        &["outcome"],
    )
    .expect("failed to create relay_connections_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register relay_connections_total");
    counter
});

static EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("relay_events_total", "Relayed events by kind and outcome"),
        &["kind", "outcome"],
    )
    .expect("failed to create relay_events_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register relay_events_total");
    counter
});

pub fn observe_http_request(method: &str, path: &str, status: u16, elapsed: Duration) {
    let status_label = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status_label])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path, &status_label])
        .observe(elapsed.as_secs_f64());
}

pub fn set_active_connections(count: usize) {
    ACTIVE_CONNECTIONS.set(count as i64);
}

/// `outcome`: accepted, rejected, abandoned
pub fn record_connection(outcome: &str) {
    CONNECTIONS_TOTAL.with_label_values(&[outcome]).inc();
}

#[cfg(test)]
pub(crate) fn connections_recorded(outcome: &str) -> u64 {
    CONNECTIONS_TOTAL.with_label_values(&[outcome]).get()
}

pub fn record_event(kind: &str, outcome: &str) {
    EVENTS_TOTAL.with_label_values(&[kind, outcome]).inc();
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::time::Instant;

/// Records count and latency for every HTTP request
pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        // Route pattern keeps label cardinality bounded (`/api/v1/presence/{user_id}`)
        let path = req
            .match_pattern()
            .unwrap_or_else(|| req.path().to_string());
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let result = service.call(req).await;
            let elapsed = start.elapsed();
            match &result {
                Ok(response) => {
                    observe_http_request(&method, &path, response.status().as_u16(), elapsed);
                }
                Err(_) => {
                    observe_http_request(&method, &path, 500, elapsed);
                }
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_counter_increments() {
        let before = EVENTS_TOTAL
            .with_label_values(&["comment", "target_offline"])
            .get();
        record_event("comment", "target_offline");
        let after = EVENTS_TOTAL
            .with_label_values(&["comment", "target_offline"])
            .get();
        assert!(after > before);
    }

    #[actix_rt::test]
    async fn test_serve_metrics_exposes_relay_metrics() {
        record_connection("accepted");
        set_active_connections(1);

        let resp = serve_metrics().await;
        assert!(resp.status().is_success());
    }
}
