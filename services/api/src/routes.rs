use std::sync::Arc;
use std::time::Duration;

use crate::infra::AppState;
use axum::http::{header, HeaderName, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use island_leads::edge::{edge_router, EdgeExportService};
use island_leads::leads::{lead_router, LeadService};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

pub(crate) fn with_service_routes(
    leads: Arc<LeadService>,
    edge: Arc<EdgeExportService>,
) -> Router {
    lead_router(leads)
        .merge(edge_router(edge))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

/// Permissive CORS for the public landing-page form and the export callers.
pub(crate) fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("apikey"),
            HeaderName::from_static("x-admin-token"),
        ])
        .expose_headers([header::CONTENT_LENGTH])
        .max_age(Duration::from_secs(600))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
