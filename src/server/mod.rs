//! JSON API server for the audit dashboard.
//!
//! Serves the filtered dataset, filter state, aggregations, and exports
//! to whatever front-end draws them. Sessions are addressed with an
//! `X-Session-Id` header; omitting it lands on a shared default session.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::DatasetCache;
use crate::config::Settings;
use crate::session::SessionStore;
use crate::sheets::{fetch_dataset, Dataset, FetchError, SheetsClient, TabularSource};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn TabularSource>,
    pub cache: Arc<DatasetCache>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(source: Arc<dyn TabularSource>, cache_ttl: Duration) -> Self {
        Self {
            source,
            cache: Arc::new(DatasetCache::with_ttl(cache_ttl)),
            sessions: Arc::new(SessionStore::new()),
        }
    }

    /// Dataset behind the heavy cache; at most one fetch per TTL window.
    pub async fn dataset(&self) -> Result<Arc<Dataset>, FetchError> {
        let source = Arc::clone(&self.source);
        self.cache
            .get_or_fetch(|| async move { fetch_dataset(source.as_ref()).await })
            .await
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let client = SheetsClient::from_settings(settings)?;
    let state = AppState::new(Arc::new(client), settings.cache_ttl());
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::sheets::{MemorySource, Table, SHEET_ALERTS, SHEET_DELTAS, SHEET_MASTER};

    fn master_table() -> Table {
        Table::new(
            vec![
                "url".into(),
                "meta_title".into(),
                "categoria".into(),
                "status_code".into(),
                "has_alerts".into(),
                "pub_date".into(),
            ],
            vec![
                vec![
                    "https://site/reviews/a".into(),
                    "Review A".into(),
                    "reviews".into(),
                    "200".into(),
                    "TRUE".into(),
                    "2023-01-10".into(),
                ],
                vec![
                    "https://site/tutoriales/b".into(),
                    "Guide B".into(),
                    "tutoriales".into(),
                    "404".into(),
                    "".into(),
                    "2023-02-20".into(),
                ],
                vec![
                    "https://site/reviews/c".into(),
                    "Review C".into(),
                    "reviews".into(),
                    "500".into(),
                    "".into(),
                    "".into(),
                ],
            ],
        )
    }

    fn alerts_table() -> Table {
        Table::new(
            vec![
                "url".into(),
                "alert_type".into(),
                "severity".into(),
                "resolved".into(),
            ],
            vec![
                vec![
                    "https://site/reviews/a".into(),
                    "thin_content".into(),
                    "ALTA".into(),
                    "".into(),
                ],
                vec![
                    "https://site/reviews/c".into(),
                    "broken_link".into(),
                    "BAJA".into(),
                    "TRUE".into(),
                ],
            ],
        )
    }

    fn deltas_table() -> Table {
        Table::new(
            vec![
                "url".into(),
                "periodo".into(),
                "clicks".into(),
                "clicks_prev".into(),
                "clicks_delta_pct".into(),
            ],
            vec![
                vec![
                    "https://site/reviews/a/".into(),
                    "7d".into(),
                    "120".into(),
                    "100".into(),
                    "20.0".into(),
                ],
                vec![
                    "https://site/tutoriales/b".into(),
                    "7d".into(),
                    "10".into(),
                    "50".into(),
                    "-80.0".into(),
                ],
            ],
        )
    }

    fn test_app() -> axum::Router {
        let source = MemorySource::new()
            .with_table(SHEET_MASTER, master_table())
            .with_table(SHEET_ALERTS, alerts_table())
            .with_table(SHEET_DELTAS, deltas_table());
        let state = AppState::new(Arc::new(source), Duration::from_secs(3600));
        create_router(state)
    }

    async fn get_json(app: &axum::Router, uri: &str) -> serde_json::Value {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = test_app();
        let json = get_json(&app, "/api/health").await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn records_default_to_unfiltered() {
        let app = test_app();
        let json = get_json(&app, "/api/records").await;
        assert_eq!(json["total"], 3);
        assert_eq!(json["filtered"], 3);
        assert_eq!(json["rows"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn apply_flow_filters_records() {
        let app = test_app();

        // Stage a pending filter for the default session.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/filters/pending")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"categorias": ["reviews"]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Pending edits alone do not change what is displayed.
        let json = get_json(&app, "/api/records").await;
        assert_eq!(json["filtered"], 3);
        let filters = get_json(&app, "/api/filters").await;
        assert_eq!(filters["dirty"], true);

        // Commit.
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/filters/apply")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = get_json(&app, "/api/records").await;
        assert_eq!(json["filtered"], 2);
        let filters = get_json(&app, "/api/filters").await;
        assert_eq!(filters["dirty"], false);
        assert_eq!(filters["applied"]["categorias"][0], "reviews");
    }

    #[tokio::test]
    async fn sessions_are_isolated_by_header() {
        let app = test_app();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/api/filters/pending")
                    .header("content-type", "application/json")
                    .header("x-session-id", "sess-a")
                    .body(Body::from(r#"{"search_text": "guide"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let a = get_json_with_session(&app, "/api/filters", "sess-a").await;
        let b = get_json_with_session(&app, "/api/filters", "sess-b").await;
        assert_eq!(a["dirty"], true);
        assert_eq!(b["dirty"], false);
    }

    async fn get_json_with_session(
        app: &axum::Router,
        uri: &str,
        session: &str,
    ) -> serde_json::Value {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header("x-session-id", session)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn summary_and_stats_endpoints_answer() {
        let app = test_app();
        let summary = get_json(&app, "/api/summary").await;
        assert_eq!(summary["total"], 3);
        assert_eq!(summary["status_ok"], 1);

        let cats = get_json(&app, "/api/stats/categories").await;
        assert_eq!(cats.as_array().unwrap().len(), 2);

        let timeline = get_json(&app, "/api/stats/timeline").await;
        assert_eq!(timeline.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn alerts_endpoint_reports_active_only() {
        let app = test_app();
        let json = get_json(&app, "/api/alerts").await;
        assert_eq!(json["summary"]["active"], 1);
        assert_eq!(json["rows"].as_array().unwrap().len(), 1);
        assert_eq!(json["rows"][0]["severity"], "ALTA");
    }

    #[tokio::test]
    async fn performance_endpoint_joins_on_filtered_master() {
        let app = test_app();
        let json = get_json(&app, "/api/performance?periodo=7d").await;
        assert_eq!(json["periodo"], "7d");
        // Both master URLs carry delta rows (trailing slash normalized).
        assert_eq!(json["rows"].as_array().unwrap().len(), 2);
        assert_eq!(json["summary"]["clicks"], 130);
    }

    #[tokio::test]
    async fn export_csv_has_attachment_headers() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/export?table=master&format=csv")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers().clone();
        assert_eq!(headers["content-type"], "text/csv");
        assert!(headers["content-disposition"]
            .to_str()
            .unwrap()
            .contains("siteaudit_master.csv"));
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("url,"));
        assert_eq!(text.lines().count(), 4);
    }

    #[tokio::test]
    async fn reload_clears_the_heavy_cache() {
        let app = test_app();
        let _ = get_json(&app, "/api/records").await;
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/reload")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_master_surfaces_as_bad_gateway() {
        let source = MemorySource::new();
        let state = AppState::new(Arc::new(source), Duration::from_secs(3600));
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/records")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().unwrap().contains("URLs_Master"));
    }
}
