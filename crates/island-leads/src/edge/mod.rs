//! Standalone export endpoints, forerunners of the admin export: each is
//! gated by its own `DOWNLOAD_TOKEN` (query parameter only) and reads its
//! upstream directly, failing closed when credentials are absent.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use csv::QuoteStyle;
use serde::Deserialize;

use crate::leads::domain::LEAD_KEY_PREFIX;
use crate::leads::service::{write_csv, CsvDocument};
use crate::leads::store::LeadStore;
use crate::leads::SheetGateway;

const EDGE_LEADS_HEADER: [&str; 6] = ["key", "timestamp", "name", "email", "whatsapp", "source"];

/// Read-only export service over the raw store rows and the spreadsheet
/// mirror. Unlike the admin export these render with conditional quoting.
#[derive(Default)]
pub struct EdgeExportService {
    download_token: Option<String>,
    store: Option<Arc<dyn LeadStore>>,
    sheets: Option<Arc<dyn SheetGateway>>,
}

#[derive(Debug, thiserror::Error)]
pub enum EdgeExportError {
    #[error("DOWNLOAD_TOKEN is not configured")]
    TokenNotConfigured,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0} not configured")]
    IntegrationNotConfigured(&'static str),
    #[error("{context}: {detail}")]
    Upstream {
        context: &'static str,
        detail: String,
    },
    #[error("csv serialization failed: {0}")]
    Csv(String),
}

impl EdgeExportService {
    pub fn new(
        download_token: Option<String>,
        store: Option<Arc<dyn LeadStore>>,
        sheets: Option<Arc<dyn SheetGateway>>,
    ) -> Self {
        Self {
            download_token,
            store,
            sheets,
        }
    }

    fn authorize(&self, provided: Option<&str>) -> Result<(), EdgeExportError> {
        let required = self
            .download_token
            .as_deref()
            .ok_or(EdgeExportError::TokenNotConfigured)?;
        match provided {
            Some(token) if !token.is_empty() && token == required => Ok(()),
            _ => Err(EdgeExportError::Unauthorized),
        }
    }

    /// Raw store rows as six-column CSV, ordered by key descending to
    /// match the store's index order.
    pub async fn leads_csv(&self, provided: Option<&str>) -> Result<CsvDocument, EdgeExportError> {
        self.authorize(provided)?;

        let store = self.store.as_ref().ok_or(
            EdgeExportError::IntegrationNotConfigured(
                "SUPABASE_URL and/or SUPABASE_SERVICE_ROLE_KEY",
            ),
        )?;

        let mut rows = store
            .get_by_prefix(LEAD_KEY_PREFIX)
            .await
            .map_err(|err| EdgeExportError::Upstream {
                context: "Failed to fetch leads",
                detail: err.to_string(),
            })?;
        rows.sort_by(|(a, _), (b, _)| b.cmp(a));

        let header: Vec<String> = EDGE_LEADS_HEADER.iter().map(|s| s.to_string()).collect();
        let records = rows.into_iter().map(|(key, lead)| {
            vec![
                key,
                lead.timestamp,
                lead.name,
                lead.email,
                lead.whatsapp,
                lead.source,
            ]
        });

        let body = write_csv(std::iter::once(header).chain(records), QuoteStyle::Necessary)
            .map_err(|err| EdgeExportError::Csv(err.to_string()))?;

        Ok(CsvDocument {
            filename: "leads.csv".to_string(),
            body,
        })
    }

    /// The configured spreadsheet range re-serialized verbatim as CSV; no
    /// header row beyond whatever the sheet itself contains.
    pub async fn sheet_csv(&self, provided: Option<&str>) -> Result<CsvDocument, EdgeExportError> {
        self.authorize(provided)?;

        let sheets = self.sheets.as_ref().ok_or(
            EdgeExportError::IntegrationNotConfigured("GOOGLE_API_KEY and/or GOOGLE_SHEET_ID"),
        )?;

        let grid = sheets
            .fetch_values()
            .await
            .map_err(|err| EdgeExportError::Upstream {
                context: "Failed to fetch sheet values",
                detail: err.to_string(),
            })?;

        let body = write_csv(grid, QuoteStyle::Necessary)
            .map_err(|err| EdgeExportError::Csv(err.to_string()))?;

        Ok(CsvDocument {
            filename: "google-sheet.csv".to_string(),
            body,
        })
    }
}

/// Routes for the standalone exports.
pub fn edge_router(service: Arc<EdgeExportService>) -> Router {
    Router::new()
        .route("/api/leads", get(leads_handler))
        .route("/api/sheets", get(sheets_handler))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
struct TokenQuery {
    #[serde(default)]
    token: Option<String>,
}

async fn leads_handler(
    State(service): State<Arc<EdgeExportService>>,
    Query(query): Query<TokenQuery>,
) -> Response {
    into_response(service.leads_csv(query.token.as_deref()).await)
}

async fn sheets_handler(
    State(service): State<Arc<EdgeExportService>>,
    Query(query): Query<TokenQuery>,
) -> Response {
    into_response(service.sheet_csv(query.token.as_deref()).await)
}

fn into_response(result: Result<CsvDocument, EdgeExportError>) -> Response {
    match result {
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
        Err(err @ EdgeExportError::Unauthorized) => {
            (StatusCode::UNAUTHORIZED, err.to_string()).into_response()
        }
        Err(other) => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()).into_response(),
    }
}
