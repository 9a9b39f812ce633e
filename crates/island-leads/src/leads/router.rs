use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::LeadSubmission;
use super::service::{ExportError, IntakeError, LeadService};

/// Router builder for the primary backend surface. Every route is also
/// registered under the gateway's unrewritten `/functions/v1/<fn>/` form,
/// because some deployments forward the path unchanged.
pub fn lead_router(service: Arc<LeadService>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/functions/v1/:function/health", get(health_handler))
        .route("/submit-lead", post(submit_handler))
        .route("/functions/v1/:function/submit-lead", post(submit_handler))
        .route("/export-leads.csv", get(export_handler))
        .route(
            "/functions/v1/:function/export-leads.csv",
            get(export_handler),
        )
        .with_state(service)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitLeadResponse {
    success: bool,
    message: &'static str,
    lead_id: String,
    email_sent: bool,
    email_error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    #[serde(default)]
    token: Option<String>,
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

// The body is parsed by hand rather than through the `Json` extractor:
// callers go through an API gateway that does not always forward a JSON
// content type, and a body that fails to parse must come back as a 500
// with an `{error, details}` payload rather than an extractor rejection.
async fn submit_handler(State(service): State<Arc<LeadService>>, body: Bytes) -> Response {
    let submission: LeadSubmission = match serde_json::from_slice(&body) {
        Ok(submission) => submission,
        Err(err) => {
            let payload = json!({
                "error": "Failed to process lead submission",
                "details": err.to_string(),
            });
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response();
        }
    };

    match service.submit(submission).await {
        Ok(outcome) => {
            let body = SubmitLeadResponse {
                success: true,
                message: "Lead submitted successfully",
                lead_id: outcome.lead_id,
                email_sent: outcome.email.sent,
                email_error: outcome.email.error,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err @ IntakeError::MissingFields) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
    }
}

async fn export_handler(
    State(service): State<Arc<LeadService>>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
) -> Response {
    let token = provided_token(&headers, query.token.as_deref());

    match service.export_csv(token.as_deref()).await {
        Ok(document) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename={}", document.filename),
                ),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
            document.body,
        )
            .into_response(),
        Err(err @ ExportError::Disabled) => {
            (StatusCode::FORBIDDEN, err.to_string()).into_response()
        }
        Err(err @ ExportError::Unauthorized) => {
            (StatusCode::UNAUTHORIZED, err.to_string()).into_response()
        }
        Err(other) => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

/// Caller token precedence: `x-admin-token` header, then `token` query
/// parameter, then `Authorization: Bearer`. First non-empty value wins.
fn provided_token(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    let admin_header = headers
        .get("x-admin-token")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = admin_header {
        return Some(token.to_string());
    }

    if let Some(token) = query_token.map(str::trim).filter(|token| !token.is_empty()) {
        return Some(token.to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
}
