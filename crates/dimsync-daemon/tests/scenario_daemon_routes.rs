//! In-process scenario tests for dimsync-daemon's HTTP endpoints.
//!
//! These tests spin up the Axum router **without** binding a TCP socket or
//! touching a real database — `connect_lazy` builds a pool that only opens a
//! connection on first query, which the health/worker-status/forbidden-token
//! paths never reach.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{Request, StatusCode};
use dimsync_config::{AppConfig, DbConfig};
use dimsync_daemon::{routes, state::AppState};
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt; // oneshot

fn test_config(sync_token: Option<&str>, liveness_path: &str) -> AppConfig {
    let db = DbConfig {
        host: "localhost".to_string(),
        user: "postgres".to_string(),
        password: String::new(),
        dbname: "test".to_string(),
        port: 5432,
    };
    AppConfig {
        oltp: db.clone(),
        olap: db,
        heartbeat_interval: Duration::from_secs(30),
        sync_token: sync_token.map(str::to_string),
        log_level: "info".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        liveness_path: liveness_path.to_string(),
    }
}

fn make_router(cfg: AppConfig) -> axum::Router {
    let pool = PgPoolOptions::new()
        .connect_lazy(&cfg.oltp.to_url())
        .expect("lazy pool construction never fails");
    let state = Arc::new(AppState {
        config: Arc::new(cfg),
        oltp: pool.clone(),
        olap: pool,
    });
    routes::build_router(state)
}

#[tokio::test]
async fn health_returns_200() {
    let router = make_router(test_config(None, "/tmp/dimsync-test-health.json"));
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn worker_status_is_not_started_without_liveness_file() {
    let path = "/tmp/dimsync-test-worker-status-missing.json";
    let _ = std::fs::remove_file(path);
    let router = make_router(test_config(None, path));
    let req = Request::builder()
        .method("GET")
        .uri("/worker-status")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["worker"], "not_started");
}

#[tokio::test]
async fn sync_rejects_mismatched_token() {
    let router = make_router(test_config(Some("s3cr3t"), "/tmp/dimsync-test-forbidden.json"));
    let req = Request::builder()
        .method("GET")
        .uri("/sync?table=ventas&op=insert&id=1&token=wrong")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let router = make_router(test_config(None, "/tmp/dimsync-test-404.json"));
    let req = Request::builder()
        .method("GET")
        .uri("/nope")
        .body(axum::body::Body::empty())
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
