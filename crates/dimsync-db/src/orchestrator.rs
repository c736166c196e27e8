use crate::error::SyncError;
use crate::{dims, fact, reader};
use dimsync_schemas::{CategoriaRow, ClienteRow, HechoVenta, ProductoRow, SyncOutcome};
use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};

/// Resolves `(table, op, id)` into dimension/fact upserts against the OLAP store.
/// Runs the whole call as one logical transaction: any error rolls the OLAP side
/// back entirely, leaving no partial fact/dimension state behind. `op` only
/// informs log lines — every change resolves to an idempotent upsert regardless
/// of whether it originated as an insert, update, or delete notification.
pub async fn sync(
    oltp: &PgPool,
    olap: &PgPool,
    table: Option<&str>,
    op: Option<&str>,
    id: Option<i64>,
) -> Result<SyncOutcome, SyncError> {
    info!(?table, ?op, ?id, "sync invoked");
    let mut tx = olap.begin().await?;

    let outcome = match table.map(|t| t.to_lowercase()).as_deref() {
        None => full_sync(oltp, &mut tx).await?,
        Some("clientes") => sync_clientes(oltp, &mut tx, id).await?,
        Some("categoria") => sync_categorias(oltp, &mut tx, id).await?,
        Some("productos") => sync_productos(oltp, &mut tx, id).await?,
        Some("ventas") => sync_ventas(oltp, &mut tx, id, None).await?,
        Some("orden") => sync_orden(oltp, &mut tx, id).await?,
        Some("orden_producto") => sync_orden_producto(oltp, &mut tx, id).await?,
        Some(other) => {
            warn!(table = other, "unrecognized table; falling back to full sync");
            full_sync(oltp, &mut tx).await?
        }
    };

    tx.commit().await?;
    Ok(outcome)
}

async fn full_sync(oltp: &PgPool, conn: &mut PgConnection) -> Result<SyncOutcome, SyncError> {
    let mut outcome = sync_clientes(oltp, conn, None).await?;
    outcome.merge(sync_categorias(oltp, conn, None).await?);
    outcome.merge(sync_productos(oltp, conn, None).await?);
    outcome.merge(sync_ventas(oltp, conn, None, None).await?);
    Ok(outcome)
}

async fn sync_clientes(oltp: &PgPool, conn: &mut PgConnection, id: Option<i64>) -> Result<SyncOutcome, SyncError> {
    let mut outcome = SyncOutcome::default();
    for row in reader::fetch_clientes(oltp, id).await? {
        dims::upsert_dim_cliente(conn, &row).await?;
        outcome.dimensions_upserted += 1;
    }
    Ok(outcome)
}

async fn sync_categorias(oltp: &PgPool, conn: &mut PgConnection, id: Option<i64>) -> Result<SyncOutcome, SyncError> {
    let mut outcome = SyncOutcome::default();
    for row in reader::fetch_categorias(oltp, id).await? {
        dims::upsert_dim_categoria(conn, &row).await?;
        outcome.dimensions_upserted += 1;
    }
    Ok(outcome)
}

async fn sync_productos(oltp: &PgPool, conn: &mut PgConnection, id: Option<i64>) -> Result<SyncOutcome, SyncError> {
    let mut outcome = SyncOutcome::default();
    for row in reader::fetch_productos(oltp, id).await? {
        dims::upsert_dim_producto(conn, &row).await?;
        outcome.dimensions_upserted += 1;
    }
    Ok(outcome)
}

async fn sync_orden(oltp: &PgPool, conn: &mut PgConnection, id_orden: Option<i64>) -> Result<SyncOutcome, SyncError> {
    let mut outcome = sync_ventas(oltp, conn, None, id_orden).await?;
    if let Some(id_orden) = id_orden {
        if let Some(id_cliente) = reader::fetch_cliente_id_for_orden(oltp, id_orden).await? {
            outcome.merge(sync_clientes(oltp, conn, Some(id_cliente)).await?);
        }
    }
    Ok(outcome)
}

async fn sync_orden_producto(oltp: &PgPool, conn: &mut PgConnection, id: Option<i64>) -> Result<SyncOutcome, SyncError> {
    let Some(id) = id else {
        return Ok(SyncOutcome::default());
    };
    match reader::fetch_orden_id_for_orden_producto(oltp, id).await? {
        Some(id_orden) => sync_ventas(oltp, conn, None, Some(id_orden)).await,
        None => {
            warn!(id, "orden_producto: could not resolve owning orden via any candidate PK column");
            Ok(SyncOutcome::default())
        }
    }
}

/// Ensures `dim_categoria` holds a row for `id_categoria`, inserting a
/// null-attribute placeholder when the source `categoria` row is missing.
/// Kept separate so its placeholder policy (P5) is directly testable.
pub async fn ensure_dim_categoria(
    oltp: &PgPool,
    conn: &mut PgConnection,
    id_categoria: i64,
) -> Result<(i64, bool), SyncError> {
    match reader::fetch_categoria_by_id(oltp, id_categoria).await? {
        Some(row) => Ok((dims::upsert_dim_categoria(conn, &row).await?, false)),
        None => {
            warn!(id_categoria, "categoria missing in source; inserting placeholder");
            let id = dims::upsert_dim_categoria(
                conn,
                &CategoriaRow {
                    id_categoria,
                    nombre_categoria: None,
                    descripcion: None,
                },
            )
            .await?;
            Ok((id, true))
        }
    }
}

/// Ensures `dim_cliente` holds a row for `id_cliente`, inserting a
/// null-attribute placeholder when the source `clientes` row is missing.
pub async fn ensure_dim_cliente(oltp: &PgPool, conn: &mut PgConnection, id_cliente: i64) -> Result<(i64, bool), SyncError> {
    match reader::fetch_cliente_plain(oltp, id_cliente).await? {
        Some(row) => Ok((dims::upsert_dim_cliente(conn, &row).await?, false)),
        None => {
            warn!(id_cliente, "cliente missing in source; inserting placeholder");
            let id = dims::upsert_dim_cliente(
                conn,
                &ClienteRow {
                    id_cliente,
                    nombre: None,
                    apellido: None,
                    edad: None,
                    email: None,
                    telefono: None,
                    direccion: None,
                    ciudad_envio: None,
                    pais_envio: None,
                },
            )
            .await?;
            Ok((id, true))
        }
    }
}

/// Ensures `dim_producto` holds a row for `id_producto`, inserting a
/// null-attribute placeholder when the source `productos` row is missing.
/// `id_categoria` is carried onto the placeholder when known (it may not be,
/// since it is itself sourced from the same missing `productos` row).
pub async fn ensure_dim_producto(
    oltp: &PgPool,
    conn: &mut PgConnection,
    id_producto: i64,
    id_categoria: Option<i64>,
) -> Result<(i64, bool), SyncError> {
    match reader::fetch_producto_by_id(oltp, id_producto).await? {
        Some(row) => Ok((dims::upsert_dim_producto(conn, &row).await?, false)),
        None => {
            warn!(id_producto, "producto missing in source; inserting placeholder");
            let id = dims::upsert_dim_producto(
                conn,
                &ProductoRow {
                    id_producto,
                    nombre_producto: None,
                    descripcion: None,
                    precio: None,
                    costo: None,
                    id_categoria,
                },
            )
            .await?;
            Ok((id, true))
        }
    }
}

/// Ensures each of the three row-backed dimensions exists before the fact row
/// is written, one dimension at a time, in the fixed order categoria, cliente,
/// producto, so a missing source row never blocks the other two.
async fn sync_ventas(
    oltp: &PgPool,
    conn: &mut PgConnection,
    id_venta: Option<i64>,
    id_orden: Option<i64>,
) -> Result<SyncOutcome, SyncError> {
    let mut outcome = SyncOutcome::default();
    let lines = reader::fetch_venta_lines(oltp, id_venta, id_orden).await?;

    for line in lines {
        let id_tiempo = dims::upsert_dim_tiempo(conn, line.fecha_venta).await?;

        // `id_categoria` is only known when `productos` still has the referenced
        // row; with it entirely gone there is no categoria to place or ensure.
        let id_categoria = match line.id_categoria {
            Some(id_categoria) => {
                let (id, created) = ensure_dim_categoria(oltp, conn, id_categoria).await?;
                if created {
                    outcome.placeholders_created += 1;
                }
                Some(id)
            }
            None => None,
        };

        let (id_cliente, cliente_placeholder) = ensure_dim_cliente(oltp, conn, line.id_cliente).await?;
        if cliente_placeholder {
            outcome.placeholders_created += 1;
        }

        let (id_producto, producto_placeholder) =
            ensure_dim_producto(oltp, conn, line.id_producto, line.id_categoria).await?;
        if producto_placeholder {
            outcome.placeholders_created += 1;
        }

        let id_metodo_pago = dims::upsert_dim_metodo_pago(conn, line.metodo_pago.as_deref()).await?;
        let id_envio = dims::upsert_dim_envio(conn, line.estado_envio.as_deref(), line.metodo_envio.as_deref()).await?;
        outcome.dimensions_upserted += 3;

        match (id_categoria, id_metodo_pago, id_envio) {
            (Some(id_categoria), Some(id_metodo_pago), Some(id_envio)) => {
                let costo = line.costo.ok_or_else(|| {
                    SyncError::Measure(format!(
                        "producto {id_producto} has no costo in source; cannot compute margen"
                    ))
                })?;
                let hecho = HechoVenta {
                    id_tiempo,
                    id_cliente,
                    id_producto,
                    id_categoria,
                    id_metodo_pago,
                    id_envio,
                    cantidad: line.cantidad,
                    total_venta: HechoVenta::total_venta(line.cantidad, line.precio_unitario),
                    costo_envio: line.costo_envio,
                    margen: HechoVenta::margen(line.precio_unitario, costo, line.cantidad),
                };
                fact::upsert_hecho_ventas(conn, &hecho).await?;
                outcome.facts_upserted += 1;
            }
            _ => {
                warn!(
                    id_tiempo, id_cliente, id_producto, ?id_categoria,
                    "venta skipped: one or more dimension surrogates could not be resolved"
                );
                outcome.facts_skipped += 1;
            }
        }
    }

    Ok(outcome)
}
