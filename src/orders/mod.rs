//! Order lifecycle: creation, listing, quantity updates, deletion.
//!
//! A submission can span several clients; lines are partitioned by client
//! code and one order is created per client. An order never exists with zero
//! lines: the quantity-update path deletes the order once the last line goes.

use std::collections::HashMap;

use crate::api::error::ApiError;
use crate::clients;
use crate::db::{
    CreateOrderRequest, DbPool, NewOrderLine, Order, OrderForUser, OrderLine, OrderWithLines,
    QuantityUpdate, ESTADO_PENDIENTE,
};

/// Lines for one client within a submission, in submission order.
#[derive(Debug, Clone)]
pub struct ClientGroup {
    pub kunnr: String,
    /// Route code taken from the first line for this client, empty when the
    /// submission carries none.
    pub sortl: String,
    pub lines: Vec<NewOrderLine>,
}

/// Outcome of a quantity update, reported distinctly to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Every line reached zero, so the order itself was removed.
    OrderDeleted,
    QuantitiesUpdated,
}

/// Partition submitted lines by client code, preserving first-seen client
/// order and per-client submission order.
pub fn partition_by_client(productos: &[NewOrderLine]) -> Vec<ClientGroup> {
    let mut groups: Vec<ClientGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for line in productos {
        match index.get(&line.kunnr) {
            Some(&i) => groups[i].lines.push(line.clone()),
            None => {
                index.insert(line.kunnr.clone(), groups.len());
                groups.push(ClientGroup {
                    kunnr: line.kunnr.clone(),
                    sortl: line.sortl.clone().unwrap_or_default(),
                    lines: vec![line.clone()],
                });
            }
        }
    }

    groups
}

/// Create one order per distinct client code in the submission.
pub async fn create_orders(pool: &DbPool, request: CreateOrderRequest) -> Result<Vec<Order>, ApiError> {
    let usuario_id = request
        .usuario_id
        .ok_or_else(|| ApiError::validation("usuario_id is required"))?;
    if request.productos.is_empty() {
        return Err(ApiError::validation("At least one product is required"));
    }

    let mut created = Vec::new();

    for group in partition_by_client(&request.productos) {
        let order: Order = sqlx::query_as(
            "INSERT INTO pedidos (usuario_id, kunnr, sortl, estado)
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(usuario_id)
        .bind(&group.kunnr)
        .bind(&group.sortl)
        .bind(ESTADO_PENDIENTE)
        .fetch_one(pool)
        .await?;

        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(
            "INSERT INTO pedido_detalle (pedido_id, matnr, arktx, cantidad, precio) ",
        );
        qb.push_values(group.lines.iter(), |mut b, line| {
            b.push_bind(order.id)
                .push_bind(&line.matnr)
                .push_bind(&line.arktx)
                .push_bind(line.cantidad)
                .push_bind(line.precio);
        });
        qb.build().execute(pool).await?;

        tracing::info!(
            order_id = order.id,
            kunnr = %order.kunnr,
            lines = group.lines.len(),
            "Created order"
        );
        created.push(order);
    }

    Ok(created)
}

async fn lines_for_order(pool: &DbPool, order_id: i32) -> Result<Vec<OrderLine>, ApiError> {
    let lines = sqlx::query_as::<_, OrderLine>(
        "SELECT * FROM pedido_detalle WHERE pedido_id = $1 ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(lines)
}

/// All orders for a user with their lines, enriched with the client names
/// from the directory. A user without orders gets an empty list, never an
/// error.
pub async fn list_orders_for_user(
    pool: &DbPool,
    usuario_id: i32,
) -> Result<Vec<OrderForUser>, ApiError> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM pedidos WHERE usuario_id = $1 ORDER BY fecha DESC, id DESC",
    )
    .bind(usuario_id)
    .fetch_all(pool)
    .await?;

    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let codes: Vec<String> = orders.iter().map(|o| o.kunnr.clone()).collect();
    let names = clients::names_for_codes(pool, &codes).await?;

    let mut result = Vec::with_capacity(orders.len());
    for order in orders {
        let detalles = lines_for_order(pool, order.id).await?;
        let (name1, name2) = names
            .get(&order.kunnr)
            .cloned()
            .unwrap_or((String::new(), String::new()));
        result.push(OrderForUser {
            order,
            detalles,
            name1,
            name2,
        });
    }

    Ok(result)
}

/// One order with its lines
pub async fn get_order_detail(pool: &DbPool, order_id: i32) -> Result<OrderWithLines, ApiError> {
    let order: Option<Order> = sqlx::query_as("SELECT * FROM pedidos WHERE id = $1")
        .bind(order_id)
        .fetch_optional(pool)
        .await?;
    let order = order.ok_or_else(|| ApiError::not_found("Order not found"))?;

    let detalles = lines_for_order(pool, order_id).await?;
    Ok(OrderWithLines { order, detalles })
}

/// Apply quantity updates to an order's lines. Quantity 0 removes the line;
/// a positive quantity updates it in place and is a no-op for a line the
/// order never had. When no lines remain the order is deleted.
pub async fn update_quantities(
    pool: &DbPool,
    order_id: i32,
    updates: &[QuantityUpdate],
) -> Result<UpdateOutcome, ApiError> {
    if updates.is_empty() {
        return Err(ApiError::validation("No products to update"));
    }
    if updates.iter().any(|u| u.cantidad < 0) {
        return Err(ApiError::validation("Quantities cannot be negative"));
    }

    for update in updates {
        if update.cantidad == 0 {
            sqlx::query("DELETE FROM pedido_detalle WHERE pedido_id = $1 AND matnr = $2")
                .bind(order_id)
                .bind(&update.matnr)
                .execute(pool)
                .await?;
        } else {
            sqlx::query(
                "UPDATE pedido_detalle SET cantidad = $1 WHERE pedido_id = $2 AND matnr = $3",
            )
            .bind(update.cantidad)
            .bind(order_id)
            .bind(&update.matnr)
            .execute(pool)
            .await?;
        }
    }

    let remaining: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pedido_detalle WHERE pedido_id = $1")
        .bind(order_id)
        .fetch_one(pool)
        .await?;

    if remaining.0 == 0 {
        sqlx::query("DELETE FROM pedidos WHERE id = $1")
            .bind(order_id)
            .execute(pool)
            .await?;
        tracing::info!(order_id, "All lines removed, order deleted");
        return Ok(UpdateOutcome::OrderDeleted);
    }

    Ok(UpdateOutcome::QuantitiesUpdated)
}

/// Delete an order and its lines
pub async fn delete_order(pool: &DbPool, order_id: i32) -> Result<(), ApiError> {
    let order: Option<Order> = sqlx::query_as("SELECT * FROM pedidos WHERE id = $1")
        .bind(order_id)
        .fetch_optional(pool)
        .await?;
    if order.is_none() {
        return Err(ApiError::not_found("Order not found"));
    }

    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM pedido_detalle WHERE pedido_id = $1")
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM pedidos WHERE id = $1")
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(order_id, "Deleted order");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(kunnr: &str, matnr: &str, cantidad: i32, sortl: Option<&str>) -> NewOrderLine {
        NewOrderLine {
            kunnr: kunnr.to_string(),
            matnr: matnr.to_string(),
            arktx: Some(format!("Producto {}", matnr)),
            cantidad,
            precio: None,
            sortl: sortl.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_partition_one_group_per_client() {
        let productos = vec![
            line("C1", "100", 2, Some("INS001")),
            line("C2", "200", 1, Some("INS002")),
            line("C1", "300", 5, Some("INS001")),
        ];

        let groups = partition_by_client(&productos);
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].kunnr, "C1");
        assert_eq!(groups[0].lines.len(), 2);
        assert_eq!(groups[0].lines[0].matnr, "100");
        assert_eq!(groups[0].lines[1].matnr, "300");

        assert_eq!(groups[1].kunnr, "C2");
        assert_eq!(groups[1].lines.len(), 1);
    }

    #[test]
    fn test_partition_preserves_first_seen_client_order() {
        let productos = vec![
            line("C9", "1", 1, None),
            line("C1", "2", 1, None),
            line("C9", "3", 1, None),
            line("C5", "4", 1, None),
        ];

        let groups = partition_by_client(&productos);
        let kunnrs: Vec<&str> = groups.iter().map(|g| g.kunnr.as_str()).collect();
        assert_eq!(kunnrs, vec!["C9", "C1", "C5"]);
    }

    #[test]
    fn test_partition_takes_sortl_from_first_line() {
        let productos = vec![
            line("C1", "100", 2, None),
            line("C1", "200", 1, Some("INS007")),
        ];

        let groups = partition_by_client(&productos);
        // First line for C1 has no route code, so the group gets the empty string.
        assert_eq!(groups[0].sortl, "");

        let productos = vec![
            line("C1", "100", 2, Some("INS007")),
            line("C1", "200", 1, None),
        ];
        let groups = partition_by_client(&productos);
        assert_eq!(groups[0].sortl, "INS007");
    }

    #[test]
    fn test_partition_empty_input() {
        assert!(partition_by_client(&[]).is_empty());
    }
}
