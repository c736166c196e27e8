use crate::error::SyncError;
use dimsync_schemas::{CategoriaRow, ClienteRow, ProductoRow, VentaLineRow};
use sqlx::{PgPool, Row};

/// Reads `clientes`, left-joined against `orden` so the dimension can carry a
/// shipping city/country. With no source `orden` row the join simply leaves
/// those columns null. Runs directly against the pool (autocommit) so a failed
/// query never leaves an aborted transaction behind for the next OLTP read.
pub async fn fetch_clientes(pool: &PgPool, id_cliente: Option<i64>) -> Result<Vec<ClienteRow>, SyncError> {
    const BASE: &str = r#"
        select c.id_cliente, c.nombre, c.apellido, c.edad, c.email, c.telefono, c.direccion,
               o.ciudad_envio, o.pais_envio
        from clientes c
        left join orden o on c.id_cliente = o.id_cliente
    "#;
    let rows = match id_cliente {
        Some(id) => {
            sqlx::query_as::<_, ClienteRow>(&format!("{BASE} where c.id_cliente = $1"))
                .bind(id)
                .fetch_all(pool)
                .await?
        }
        None => sqlx::query_as::<_, ClienteRow>(BASE).fetch_all(pool).await?,
    };
    Ok(rows)
}

/// Plain `clientes` lookup by id with no `orden` join, used while ensuring a
/// dimension row exists during fact processing (the shipping attributes are
/// simply left unset in that path, matching upstream behavior).
pub async fn fetch_cliente_plain(pool: &PgPool, id_cliente: i64) -> Result<Option<ClienteRow>, SyncError> {
    let row = sqlx::query_as::<_, ClienteRow>(
        r#"select id_cliente, nombre, apellido, edad, email, telefono, direccion,
                  null::text as ciudad_envio, null::text as pais_envio
           from clientes where id_cliente = $1"#,
    )
    .bind(id_cliente)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn fetch_categorias(pool: &PgPool, id_categoria: Option<i64>) -> Result<Vec<CategoriaRow>, SyncError> {
    let rows = match id_categoria {
        Some(id) => {
            sqlx::query_as::<_, CategoriaRow>("select id_categoria, nombre_categoria, descripcion from categoria where id_categoria = $1")
                .bind(id)
                .fetch_all(pool)
                .await?
        }
        None => {
            sqlx::query_as::<_, CategoriaRow>("select id_categoria, nombre_categoria, descripcion from categoria")
                .fetch_all(pool)
                .await?
        }
    };
    Ok(rows)
}

pub async fn fetch_categoria_by_id(pool: &PgPool, id_categoria: i64) -> Result<Option<CategoriaRow>, SyncError> {
    let row = sqlx::query_as::<_, CategoriaRow>(
        "select id_categoria, nombre_categoria, descripcion from categoria where id_categoria = $1",
    )
    .bind(id_categoria)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn fetch_productos(pool: &PgPool, id_producto: Option<i64>) -> Result<Vec<ProductoRow>, SyncError> {
    const BASE: &str = "select id_producto, nombre_producto, descripcion, precio, costo, id_categoria from productos";
    let rows = match id_producto {
        Some(id) => {
            sqlx::query_as::<_, ProductoRow>(&format!("{BASE} where id_producto = $1"))
                .bind(id)
                .fetch_all(pool)
                .await?
        }
        None => sqlx::query_as::<_, ProductoRow>(BASE).fetch_all(pool).await?,
    };
    Ok(rows)
}

pub async fn fetch_producto_by_id(pool: &PgPool, id_producto: i64) -> Result<Option<ProductoRow>, SyncError> {
    let row = sqlx::query_as::<_, ProductoRow>(
        "select id_producto, nombre_producto, descripcion, precio, costo, id_categoria from productos where id_producto = $1",
    )
    .bind(id_producto)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Flattened sale-line reader backing `ventas`/`orden` incremental sync.
/// Exactly one of `id_venta`/`id_orden` should be set; with neither, every
/// sale line in the source is returned (full refresh). `productos` is left-joined
/// so a sale line referencing a producto absent from OLTP is still returned
/// (with `id_categoria`/`precio`/`costo` null) instead of being silently dropped —
/// `id_producto` itself always comes from `orden_producto`, never from this join.
pub async fn fetch_venta_lines(
    pool: &PgPool,
    id_venta: Option<i64>,
    id_orden: Option<i64>,
) -> Result<Vec<VentaLineRow>, SyncError> {
    const BASE: &str = r#"
        select v.fecha_venta, o.id_cliente, op.id_producto, p.id_categoria, v.metodo_pago,
               o.estado_envio, o.metodo_envio, op.cantidad, op.precio_unitario, p.precio, p.costo, o.costo_envio
        from ventas v
        join orden o on v.id_orden = o.id_orden
        join orden_producto op on o.id_orden = op.id_orden
        left join productos p on op.id_producto = p.id_producto
    "#;
    let rows = if let Some(id) = id_venta {
        sqlx::query_as::<_, VentaLineRow>(&format!("{BASE} where v.id_venta = $1"))
            .bind(id)
            .fetch_all(pool)
            .await?
    } else if let Some(id) = id_orden {
        sqlx::query_as::<_, VentaLineRow>(&format!("{BASE} where o.id_orden = $1"))
            .bind(id)
            .fetch_all(pool)
            .await?
    } else {
        sqlx::query_as::<_, VentaLineRow>(BASE).fetch_all(pool).await?
    };
    Ok(rows)
}

pub async fn fetch_cliente_id_for_orden(pool: &PgPool, id_orden: i64) -> Result<Option<i64>, SyncError> {
    let row = sqlx::query("select id_cliente from orden where id_orden = $1")
        .bind(id_orden)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|r| r.get::<i64, _>("id_cliente")))
}

/// `orden_producto`'s primary-key column name is not known ahead of time; try
/// each candidate in order and move on to the next on any query error (an
/// unknown column, for instance).
pub const ORDEN_PRODUCTO_PK_CANDIDATES: &[&str] = &["id_op", "id_orden_producto", "id"];

pub async fn fetch_orden_id_for_orden_producto(pool: &PgPool, id: i64) -> Result<Option<i64>, SyncError> {
    for pk_field in ORDEN_PRODUCTO_PK_CANDIDATES {
        let query = format!("select id_orden from orden_producto where {pk_field} = $1");
        match sqlx::query(&query).bind(id).fetch_optional(pool).await {
            Ok(Some(row)) => return Ok(Some(row.get::<i64, _>("id_orden"))),
            Ok(None) => continue,
            Err(_) => continue,
        }
    }
    Ok(None)
}
