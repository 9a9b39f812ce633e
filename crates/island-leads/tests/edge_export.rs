mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use common::*;
use tower::ServiceExt;

const BODY_LIMIT: usize = 1024 * 1024;

const TOKEN: &str = "download-token";

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn text_body(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), BODY_LIMIT)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

#[tokio::test]
async fn leads_export_renders_key_column_with_conditional_quoting() {
    let store = Arc::new(MemoryStore::default());
    let mut tricky = lead("2025-01-01T10:00:00Z", "Comma");
    tricky.name = "Doe, Jane".to_string();
    store.seed("lead_1000_aaaaaaaaa", tricky);
    store.seed("lead_2000_bbbbbbbbb", lead("2025-02-01T10:00:00Z", "Plain"));

    let router = edge_test_router(Some(TOKEN), Some(store), None);
    let response = router
        .oneshot(get(&format!("/api/leads?token={TOKEN}")))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok()),
        Some("attachment; filename=leads.csv")
    );

    let body = text_body(response).await;
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines[0], "key,timestamp,name,email,whatsapp,source");
    // Ordered by key descending; plain fields stay unquoted, the embedded
    // comma forces quotes.
    assert!(lines[1].starts_with("lead_2000_bbbbbbbbb,2025-02-01T10:00:00Z,Plain"));
    assert!(lines[2].contains("\"Doe, Jane\""));
}

#[tokio::test]
async fn leads_export_auth_failures() {
    let store = Arc::new(MemoryStore::default());
    store.seed("lead_1_aaaaaaaaa", lead("2025-01-01T10:00:00Z", "Hidden"));

    // Wrong token.
    let router = edge_test_router(Some(TOKEN), Some(store.clone()), None);
    let response = router
        .oneshot(get("/api/leads?token=wrong"))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = text_body(response).await;
    assert!(!body.contains("Hidden"));

    // Token never configured: fail closed even with a caller token.
    let router = edge_test_router(None, Some(store), None);
    let response = router
        .oneshot(get(&format!("/api/leads?token={TOKEN}")))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(text_body(response).await.contains("DOWNLOAD_TOKEN"));
}

#[tokio::test]
async fn leads_export_requires_store_credentials() {
    let router = edge_test_router(Some(TOKEN), None, None);
    let response = router
        .oneshot(get(&format!("/api/leads?token={TOKEN}")))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(text_body(response).await.contains("SUPABASE_URL"));
}

#[tokio::test]
async fn sheet_mirror_reserializes_the_raw_grid() {
    let sheet = Arc::new(MemorySheet::default());
    {
        let mut rows = sheet.rows.lock().expect("rows");
        rows.push(vec![
            "timestamp".to_string(),
            "name".to_string(),
            "notes".to_string(),
        ]);
        rows.push(vec![
            "2025-01-01T10:00:00Z".to_string(),
            "Jane".to_string(),
            "said \"call me\"".to_string(),
        ]);
    }

    let router = edge_test_router(Some(TOKEN), None, Some(sheet));
    let response = router
        .oneshot(get(&format!("/api/sheets?token={TOKEN}")))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok()),
        Some("attachment; filename=google-sheet.csv")
    );

    let body = text_body(response).await;
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines[0], "timestamp,name,notes");
    assert_eq!(
        lines[1],
        "2025-01-01T10:00:00Z,Jane,\"said \"\"call me\"\"\""
    );
}

#[tokio::test]
async fn sheet_mirror_requires_sheet_credentials() {
    let router = edge_test_router(Some(TOKEN), None, None);
    let response = router
        .oneshot(get(&format!("/api/sheets?token={TOKEN}")))
        .await
        .expect("router dispatch");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(text_body(response).await.contains("GOOGLE_API_KEY"));
}
