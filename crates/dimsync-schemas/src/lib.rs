use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Source-side (OLTP) rows, read-only projections of the transactional schema.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ClienteRow {
    pub id_cliente: i64,
    pub nombre: Option<String>,
    pub apellido: Option<String>,
    pub edad: Option<i32>,
    pub email: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub ciudad_envio: Option<String>,
    pub pais_envio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CategoriaRow {
    pub id_categoria: i64,
    pub nombre_categoria: Option<String>,
    pub descripcion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ProductoRow {
    pub id_producto: i64,
    pub nombre_producto: Option<String>,
    pub descripcion: Option<String>,
    pub precio: Option<f64>,
    pub costo: Option<f64>,
    pub id_categoria: Option<i64>,
}

/// Flattened join of `ventas` + `orden` + `orden_producto` + `productos`, one row per
/// sale line, exactly what the fact upsert needs. `id_producto` comes from
/// `orden_producto` directly, so it is always present even when the referenced
/// producto itself is missing; `id_categoria`, `precio`, and `costo` come from
/// the left-joined `productos` row and so are null in exactly that case.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct VentaLineRow {
    pub fecha_venta: NaiveDate,
    pub id_cliente: i64,
    pub id_producto: i64,
    pub id_categoria: Option<i64>,
    pub metodo_pago: Option<String>,
    pub estado_envio: Option<String>,
    pub metodo_envio: Option<String>,
    pub cantidad: f64,
    pub precio_unitario: f64,
    pub precio: Option<f64>,
    pub costo: Option<f64>,
    pub costo_envio: Option<f64>,
}

/// Resolved dimension surrogate keys plus measures for one fact row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HechoVenta {
    pub id_tiempo: i64,
    pub id_cliente: i64,
    pub id_producto: i64,
    pub id_categoria: i64,
    pub id_metodo_pago: i64,
    pub id_envio: i64,
    pub cantidad: f64,
    pub total_venta: f64,
    pub costo_envio: Option<f64>,
    pub margen: f64,
}

impl HechoVenta {
    /// `total_venta = cantidad * precio_unitario`.
    pub fn total_venta(cantidad: f64, precio_unitario: f64) -> f64 {
        cantidad * precio_unitario
    }

    /// `margen = (precio_unitario - costo) * cantidad`.
    pub fn margen(precio_unitario: f64, costo: f64, cantidad: f64) -> f64 {
        (precio_unitario - costo) * cantidad
    }
}

/// A change notification as delivered on a `{table}_sync` channel, already split
/// into its `op` and `id` parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncNotification {
    pub table: String,
    pub op: String,
    pub id: Option<i64>,
}

impl SyncNotification {
    /// Parses a `"<op>:<id>"` payload. A payload with no colon becomes
    /// `op = "unknown"` with the raw payload carried as a non-numeric id (dropped).
    pub fn parse(table: &str, payload: &str) -> Self {
        let (op, id_part) = match payload.split_once(':') {
            Some((op, rest)) => (op.to_string(), rest.to_string()),
            None => ("unknown".to_string(), payload.to_string()),
        };
        let id = id_part.trim().parse::<i64>().ok();
        SyncNotification {
            table: table.to_string(),
            op,
            id,
        }
    }
}

/// The outcome of a single `sync()` invocation, reported back to callers
/// (the HTTP trigger surface, tests) without requiring a re-query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub facts_upserted: u32,
    pub dimensions_upserted: u32,
    pub placeholders_created: u32,
    pub facts_skipped: u32,
}

impl SyncOutcome {
    pub fn merge(&mut self, other: SyncOutcome) {
        self.facts_upserted += other.facts_upserted;
        self.dimensions_upserted += other.dimensions_upserted;
        self.placeholders_created += other.placeholders_created;
        self.facts_skipped += other.facts_skipped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_op_and_id() {
        let n = SyncNotification::parse("ventas", "insert:42");
        assert_eq!(n.table, "ventas");
        assert_eq!(n.op, "insert");
        assert_eq!(n.id, Some(42));
    }

    #[test]
    fn tolerates_missing_colon() {
        let n = SyncNotification::parse("productos", "oops");
        assert_eq!(n.op, "unknown");
        assert_eq!(n.id, None);
    }

    #[test]
    fn tolerates_non_integer_id() {
        let n = SyncNotification::parse("clientes", "update:abc");
        assert_eq!(n.op, "update");
        assert_eq!(n.id, None);
    }

    #[test]
    fn measure_identities() {
        assert_eq!(HechoVenta::total_venta(2.0, 120.0), 240.0);
        assert_eq!(HechoVenta::margen(120.0, 60.0, 2.0), 120.0);
    }
}
