use crate::error::SyncError;
use dimsync_schemas::HechoVenta;
use sqlx::PgConnection;

/// Overwrites measures on conflict; the composite PK is the full dimension key.
pub async fn upsert_hecho_ventas(conn: &mut PgConnection, hecho: &HechoVenta) -> Result<(), SyncError> {
    sqlx::query(
        r#"
        insert into hecho_ventas (
            id_tiempo, id_cliente, id_producto, id_categoria, id_metodo_pago, id_envio,
            cantidad, total_venta, costo_envio, margen
        ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        on conflict (id_tiempo, id_cliente, id_producto, id_categoria, id_metodo_pago, id_envio)
        do update set
            cantidad = excluded.cantidad,
            total_venta = excluded.total_venta,
            costo_envio = excluded.costo_envio,
            margen = excluded.margen
        "#,
    )
    .bind(hecho.id_tiempo)
    .bind(hecho.id_cliente)
    .bind(hecho.id_producto)
    .bind(hecho.id_categoria)
    .bind(hecho.id_metodo_pago)
    .bind(hecho.id_envio)
    .bind(hecho.cantidad)
    .bind(hecho.total_venta)
    .bind(hecho.costo_envio)
    .bind(hecho.margen)
    .execute(conn)
    .await?;
    Ok(())
}
