use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use dimsync_config::AppConfig;
use dimsync_schemas::SyncNotification;
use sqlx::postgres::{PgListener, PgNotification};
use sqlx::PgPool;
use tracing::{error, info, warn};

pub mod liveness;

pub use liveness::Liveness;

const CHANNELS: &[&str] = &["ventas", "productos", "clientes", "categoria", "orden", "orden_producto"];
const READINESS_WAIT: Duration = Duration::from_secs(5);

/// Runs the notification-driven dispatch loop until a shutdown signal arrives
/// or the subscription connection is lost (the latter is treated as fatal —
/// the caller should exit the process and let a supervisor restart it).
pub async fn run(cfg: Arc<AppConfig>, oltp: PgPool, olap: PgPool) -> Result<()> {
    let mut listener = PgListener::connect(&cfg.oltp.to_url())
        .await
        .context("failed to open notification listener connection")?;

    for table in CHANNELS {
        let channel = format!("{table}_sync");
        listener
            .listen(&channel)
            .await
            .with_context(|| format!("LISTEN {channel} failed"))?;
    }
    info!(channels = ?CHANNELS, "dispatcher subscribed");

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                running.store(false, Ordering::SeqCst);
            }
        });
    }

    let mut last_heartbeat = Instant::now() - cfg.heartbeat_interval;

    while running.load(Ordering::SeqCst) {
        if last_heartbeat.elapsed() >= cfg.heartbeat_interval {
            last_heartbeat = Instant::now();
            info!("worker heartbeat: alive");
            if let Err(e) = liveness::write(&cfg.liveness_path) {
                warn!(error = %e, "failed to write liveness artifact");
            }
        }

        match tokio::time::timeout(READINESS_WAIT, listener.recv()).await {
            Ok(Ok(first)) => {
                dispatch_one(&oltp, &olap, first).await;
                if let Err(e) = drain_pending(&oltp, &olap, &mut listener).await {
                    error!(error = %e, "notification subscription lost while draining; exiting");
                    return Err(e.into());
                }
            }
            Ok(Err(e)) => {
                error!(error = %e, "notification subscription lost; exiting");
                return Err(e.into());
            }
            Err(_timeout) => continue,
        }
    }

    info!("dispatcher stopped");
    Ok(())
}

async fn drain_pending(oltp: &PgPool, olap: &PgPool, listener: &mut PgListener) -> Result<(), sqlx::Error> {
    while let Some(notification) = listener.try_recv().await? {
        dispatch_one(oltp, olap, notification).await;
    }
    Ok(())
}

async fn dispatch_one(oltp: &PgPool, olap: &PgPool, notification: PgNotification) {
    let channel = notification.channel().to_string();
    let table = channel.trim_end_matches("_sync").to_string();
    let parsed = SyncNotification::parse(&table, notification.payload());

    info!(table = %parsed.table, op = %parsed.op, id = ?parsed.id, "notification received");

    if let Err(e) = dimsync_db::sync(oltp, olap, Some(&parsed.table), Some(&parsed.op), parsed.id).await {
        error!(table = %parsed.table, op = %parsed.op, id = ?parsed.id, error = %e, "sync failed for notification; continuing");
    }
}
