//! Axum router and all HTTP handlers for dimsync-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use crate::api_types::{ErrorResponse, SyncParams, TriggerResponse};
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/worker-status", get(worker_status))
        .route("/sync", get(sync_handler))
        .fallback(not_found)
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn worker_status(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    Json(dimsync_dispatcher::liveness::read(&st.config.liveness_path))
}

/// `GET /sync?table=&op=&id=&token=`. Rejects with 403 when a `SYNC_TOKEN` is
/// configured and the caller's token does not match it; otherwise invokes the
/// orchestrator in-process and reports the outcome.
pub(crate) async fn sync_handler(State(st): State<Arc<AppState>>, Query(params): Query<SyncParams>) -> Response {
    if let Some(expected) = &st.config.sync_token {
        if params.token.as_deref() != Some(expected.as_str()) {
            return (StatusCode::FORBIDDEN, Json(ErrorResponse { error: "forbidden".to_string() })).into_response();
        }
    }

    let outcome = dimsync_db::sync(
        &st.oltp,
        &st.olap,
        params.table.as_deref(),
        params.op.as_deref(),
        params.id,
    )
    .await;

    match outcome {
        Ok(o) => Json(TriggerResponse {
            returncode: 0,
            stdout: vec![format!(
                "facts_upserted={} dimensions_upserted={} placeholders_created={} facts_skipped={}",
                o.facts_upserted, o.dimensions_upserted, o.placeholders_created, o.facts_skipped
            )],
            stderr: vec![],
        })
        .into_response(),
        Err(e) => Json(TriggerResponse {
            returncode: 1,
            stdout: vec![],
            stderr: vec![e.to_string()],
        })
        .into_response(),
    }
}

async fn not_found() -> impl IntoResponse {
    StatusCode::NOT_FOUND
}
