//! dimsync-daemon entry point.
//!
//! Thin by design: loads config, opens the OLTP/OLAP pools, spawns the
//! notification dispatcher as a background task, and serves the HTTP trigger
//! surface. All route handlers live in `routes.rs`; all shared state lives in
//! `state.rs`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use dimsync_config::AppConfig;
use dimsync_daemon::{routes, state::AppState};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Dev convenience: silent if the file does not exist, production injects
    // env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    let cfg = Arc::new(AppConfig::from_env().context("failed to load configuration")?);
    init_tracing(&cfg.log_level);

    let oltp = dimsync_db::connect_oltp(&cfg.oltp).await?;
    let olap = dimsync_db::connect_olap(&cfg.olap).await?;

    let state = Arc::new(AppState {
        config: cfg.clone(),
        oltp: oltp.clone(),
        olap: olap.clone(),
    });

    let dispatcher_cfg = cfg.clone();
    tokio::spawn(async move {
        if let Err(e) = dimsync_dispatcher::run(dispatcher_cfg, oltp, olap).await {
            error!(error = %e, "dispatcher exited fatally");
            std::process::exit(1);
        }
    });

    let app = routes::build_router(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    let addr = SocketAddr::new(
        cfg.host.parse().context("HOST is not a valid IP address")?,
        cfg.port,
    );
    info!("dimsync-daemon listening on http://{addr}");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
