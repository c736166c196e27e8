use anyhow::{Context, Result};
use dimsync_config::DbConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};

mod dims;
mod error;
mod fact;
mod orchestrator;
mod reader;

pub use dims::{derive_time_fields, upsert_dim_tiempo};
pub use error::SyncError;
pub use orchestrator::{ensure_dim_categoria, ensure_dim_cliente, ensure_dim_producto, sync};
pub use reader::ORDEN_PRODUCTO_PK_CANDIDATES;

/// A short-lived pool for the OLTP side. Connections run autocommit, one
/// statement at a time, so a failed read never leaves behind an aborted
/// transaction for the next query on that connection.
pub async fn connect_oltp(cfg: &DbConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(&cfg.to_url())
        .await
        .context("failed to connect to OLTP database")
}

/// The OLAP pool backs one logical transaction per `sync()` call.
pub async fn connect_olap(cfg: &DbConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(&cfg.to_url())
        .await
        .context("failed to connect to OLAP database")
}
