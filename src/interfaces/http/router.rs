//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::common::ApiResponse;
use super::modules::dispensers::{self, DispenserAppState};
use super::modules::health::{self, HealthState};
use super::modules::metrics::{http_metrics_middleware, prometheus_metrics, MetricsState};
use crate::application::DispenserService;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        dispensers::create_dispenser,
        dispensers::get_dispenser,
        dispensers::update_status,
        dispensers::get_spending,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            health::ComponentHealth,
            dispensers::CreateDispenserRequest,
            dispensers::DispenserResponse,
            dispensers::DispenserDetailResponse,
            dispensers::UpdateStatusRequest,
            dispensers::StatusResponse,
            dispensers::UsageResponse,
            dispensers::SpendingResponse,
        )
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Dispensers", description = "Beer tap dispensers: registration, open/close, spending"),
    ),
    info(
        title = "Beer Tap Dispenser API",
        version = "1.0.0",
        description = "REST API for operating beer tap dispensers and billing their usage",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Everything the router needs from bootstrap
pub struct RouterDeps {
    pub service: Arc<DispenserService>,
    /// Pinged by `/health`; `None` on the in-memory registry
    pub db: Option<DatabaseConnection>,
    pub prometheus: Option<PrometheusHandle>,
}

/// Create the API router with all routes
pub fn create_api_router(deps: RouterDeps) -> Router {
    let dispenser_routes = Router::new()
        .route("/", post(dispensers::create_dispenser))
        .route("/{dispenser_id}", get(dispensers::get_dispenser))
        .route("/{dispenser_id}/status", put(dispensers::update_status))
        .route("/{dispenser_id}/spending", get(dispensers::get_spending))
        .with_state(DispenserAppState {
            service: deps.service,
        });

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(HealthState {
            db: deps.db,
            started_at: Arc::new(Instant::now()),
        });

    let metrics_routes = Router::new()
        .route("/metrics", get(prometheus_metrics))
        .with_state(MetricsState {
            handle: deps.prometheus,
        });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .nest("/api/v1/dispensers", dispenser_routes)
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ── Tests ──────────────────────────────────────────────────────
