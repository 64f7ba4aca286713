//! HTTP request metrics middleware

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

/// Label for requests that hit no route
const UNMATCHED: &str = "unmatched";

/// Labels shared by the request counter and the latency histogram.
///
/// `path` is the route template (`/api/v1/dispensers/{dispenser_id}`), never
/// the concrete URI, so dispenser ids do not become label values.
struct RequestLabels {
    method: String,
    path: String,
}

impl RequestLabels {
    fn of(request: &Request<Body>) -> Self {
        let path = match request.extensions().get::<MatchedPath>() {
            Some(matched) => matched.as_str().to_owned(),
            None => UNMATCHED.to_owned(),
        };
        Self {
            method: request.method().as_str().to_owned(),
            path,
        }
    }

    fn record(self, status: StatusCode, elapsed: Duration) {
        metrics::counter!(
            "http_requests_total",
            "method" => self.method.clone(),
            "path" => self.path.clone(),
            "status" => status.as_u16().to_string()
        )
        .increment(1);
        metrics::histogram!(
            "http_request_duration_seconds",
            "method" => self.method,
            "path" => self.path
        )
        .record(elapsed.as_secs_f64());
    }
}

/// Count every request and time it, labelled by method, route and status.
pub async fn http_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let labels = RequestLabels::of(&request);
    let started = Instant::now();

    let response = next.run(request).await;
    labels.record(response.status(), started.elapsed());
    response
}
