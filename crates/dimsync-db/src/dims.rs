use crate::error::SyncError;
use chrono::{Datelike, NaiveDate};
use dimsync_schemas::{CategoriaRow, ClienteRow, ProductoRow};
use sqlx::{Connection, PgConnection, Row};

/// Overwrites every attribute on conflict — dimensions here are type-1, no history kept.
pub async fn upsert_dim_cliente(conn: &mut PgConnection, cliente: &ClienteRow) -> Result<i64, SyncError> {
    let row = sqlx::query(
        r#"
        insert into dim_cliente (id_cliente, nombre, apellido, edad, email, telefono, direccion, ciudad, pais)
        values ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        on conflict (id_cliente) do update set
            nombre = excluded.nombre, apellido = excluded.apellido, edad = excluded.edad,
            email = excluded.email, telefono = excluded.telefono, direccion = excluded.direccion,
            ciudad = excluded.ciudad, pais = excluded.pais
        returning id_cliente
        "#,
    )
    .bind(cliente.id_cliente)
    .bind(&cliente.nombre)
    .bind(&cliente.apellido)
    .bind(cliente.edad)
    .bind(&cliente.email)
    .bind(&cliente.telefono)
    .bind(&cliente.direccion)
    .bind(&cliente.ciudad_envio)
    .bind(&cliente.pais_envio)
    .fetch_one(conn)
    .await?;
    Ok(row.get::<i64, _>("id_cliente"))
}

pub async fn upsert_dim_categoria(conn: &mut PgConnection, categoria: &CategoriaRow) -> Result<i64, SyncError> {
    let row = sqlx::query(
        r#"
        insert into dim_categoria (id_categoria, nombre_categoria, descripcion)
        values ($1, $2, $3)
        on conflict (id_categoria) do update set
            nombre_categoria = excluded.nombre_categoria, descripcion = excluded.descripcion
        returning id_categoria
        "#,
    )
    .bind(categoria.id_categoria)
    .bind(&categoria.nombre_categoria)
    .bind(&categoria.descripcion)
    .fetch_one(conn)
    .await?;
    Ok(row.get::<i64, _>("id_categoria"))
}

pub async fn upsert_dim_producto(conn: &mut PgConnection, producto: &ProductoRow) -> Result<i64, SyncError> {
    let row = sqlx::query(
        r#"
        insert into dim_producto (id_producto, nombre_producto, descripcion, precio, costo, id_categoria)
        values ($1, $2, $3, $4, $5, $6)
        on conflict (id_producto) do update set
            nombre_producto = excluded.nombre_producto, descripcion = excluded.descripcion,
            precio = excluded.precio, costo = excluded.costo, id_categoria = excluded.id_categoria
        returning id_producto
        "#,
    )
    .bind(producto.id_producto)
    .bind(&producto.nombre_producto)
    .bind(&producto.descripcion)
    .bind(producto.precio)
    .bind(producto.costo)
    .bind(producto.id_categoria)
    .fetch_one(conn)
    .await?;
    Ok(row.get::<i64, _>("id_producto"))
}

/// `trimestre` and `semana` (ISO week) are derived in Rust since they can't be
/// expressed portably inside a single upsert statement.
pub fn derive_time_fields(fecha: NaiveDate) -> (i32, u32, u32, u32, u32) {
    let anio = fecha.year();
    let mes = fecha.month();
    let dia = fecha.day();
    let trimestre = (mes - 1) / 3 + 1;
    let semana = fecha.iso_week().week();
    (anio, mes, dia, trimestre, semana)
}

/// Select-then-insert-then-select-on-conflict: `fecha` is the natural key, but
/// the derived columns mean the insert can't be a single portable
/// `ON CONFLICT ... DO UPDATE` statement. The insert runs inside a SAVEPOINT
/// (`conn.begin()` nests when `conn` is already mid-transaction) so a
/// unique-violation only aborts the savepoint, not the whole `sync()` call —
/// without it, Postgres marks the entire surrounding transaction aborted and
/// the fallback select below would itself fail.
pub async fn upsert_dim_tiempo(conn: &mut PgConnection, fecha: NaiveDate) -> Result<i64, SyncError> {
    if let Some(id) = select_dim_tiempo(conn, fecha).await? {
        return Ok(id);
    }

    let (anio, mes, dia, trimestre, semana) = derive_time_fields(fecha);
    let mut savepoint = conn.begin().await?;
    let inserted = sqlx::query(
        r#"
        insert into dim_tiempo (fecha, anio, mes, dia, trimestre, semana)
        values ($1, $2, $3, $4, $5, $6)
        returning id_tiempo
        "#,
    )
    .bind(fecha)
    .bind(anio)
    .bind(mes as i32)
    .bind(dia as i32)
    .bind(trimestre as i32)
    .bind(semana as i32)
    .fetch_one(&mut *savepoint)
    .await;

    match inserted {
        Ok(row) => {
            savepoint.commit().await?;
            Ok(row.get::<i64, _>("id_tiempo"))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            savepoint.rollback().await?;
            select_dim_tiempo(conn, fecha)
                .await?
                .ok_or_else(|| SyncError::Database(sqlx::Error::RowNotFound))
        }
        Err(e) => {
            savepoint.rollback().await?;
            Err(SyncError::Database(e))
        }
    }
}

async fn select_dim_tiempo(conn: &mut PgConnection, fecha: NaiveDate) -> Result<Option<i64>, SyncError> {
    let row = sqlx::query("select id_tiempo from dim_tiempo where fecha = $1")
        .bind(fecha)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(|r| r.get::<i64, _>("id_tiempo")))
}

/// Empty string is a valid payment method key, per upstream behavior.
pub async fn upsert_dim_metodo_pago(conn: &mut PgConnection, metodo_pago: Option<&str>) -> Result<Option<i64>, SyncError> {
    let row = sqlx::query(
        r#"
        insert into dim_metodo_pago (metodo_pago)
        values ($1)
        on conflict (metodo_pago) do update set metodo_pago = excluded.metodo_pago
        returning id_metodo_pago
        "#,
    )
    .bind(metodo_pago)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|r| r.get::<i64, _>("id_metodo_pago")))
}

pub async fn upsert_dim_envio(
    conn: &mut PgConnection,
    estado_envio: Option<&str>,
    metodo_envio: Option<&str>,
) -> Result<Option<i64>, SyncError> {
    let row = sqlx::query(
        r#"
        insert into dim_envio (estado_envio, metodo_envio)
        values ($1, $2)
        on conflict (estado_envio, metodo_envio) do update set
            estado_envio = excluded.estado_envio, metodo_envio = excluded.metodo_envio
        returning id_envio
        "#,
    )
    .bind(estado_envio)
    .bind(metodo_envio)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(|r| r.get::<i64, _>("id_envio")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn derives_quarter_and_iso_week() {
        let fecha = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (anio, mes, dia, trimestre, semana) = derive_time_fields(fecha);
        assert_eq!((anio, mes, dia, trimestre), (2024, 3, 15, 1));
        assert_eq!(semana, 11);
    }

    #[test]
    fn quarter_boundaries() {
        assert_eq!(derive_time_fields(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).3, 1);
        assert_eq!(derive_time_fields(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()).3, 2);
        assert_eq!(derive_time_fields(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()).3, 3);
        assert_eq!(derive_time_fields(NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()).3, 4);
    }
}
