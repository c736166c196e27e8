//! Shared runtime state for dimsync-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum; this module owns nothing
//! async itself, just the pooled connections and the loaded configuration.

use std::sync::Arc;

use dimsync_config::AppConfig;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub oltp: PgPool,
    pub olap: PgPool,
}
