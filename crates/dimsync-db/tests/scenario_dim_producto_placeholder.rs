use dimsync_config::DbConfig;

fn db_config(prefix: &str) -> Option<DbConfig> {
    Some(DbConfig {
        host: std::env::var(format!("{prefix}_HOST")).ok()?,
        user: std::env::var(format!("{prefix}_USER")).ok()?,
        password: std::env::var(format!("{prefix}_PASSWORD")).unwrap_or_default(),
        dbname: std::env::var(format!("{prefix}_DBNAME")).ok()?,
        port: std::env::var(format!("{prefix}_PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5432),
    })
}

/// P5: ensuring a dimension for an id absent from OLTP inserts a
/// null-attribute placeholder exactly once; ensuring it again finds the row
/// already there and does not report a fresh placeholder.
#[tokio::test]
async fn ensure_dim_producto_inserts_placeholder_for_missing_source_row() -> anyhow::Result<()> {
    let (Some(oltp_cfg), Some(olap_cfg)) = (db_config("OLTP"), db_config("OLAP")) else {
        eprintln!("SKIP: OLTP_*/OLAP_* env vars not set");
        return Ok(());
    };

    let oltp = dimsync_db::connect_oltp(&oltp_cfg).await?;
    let olap = dimsync_db::connect_olap(&olap_cfg).await?;

    // An id vanishingly unlikely to exist in a real `productos` table.
    let missing_id: i64 = 987_654_321;

    let mut tx = olap.begin().await?;

    let (id_first, created_first) = dimsync_db::ensure_dim_producto(&oltp, &mut tx, missing_id, Some(1)).await?;
    assert_eq!(id_first, missing_id);
    assert!(created_first, "first ensure on a missing source row must report a placeholder");

    let (id_second, created_second) = dimsync_db::ensure_dim_producto(&oltp, &mut tx, missing_id, Some(1)).await?;
    assert_eq!(id_second, missing_id);
    assert!(!created_second, "second ensure must find the placeholder already in place");

    tx.rollback().await?;
    Ok(())
}
