//! Order and order-line models.
//!
//! An order (`pedidos` row) is scoped to exactly one client code and always
//! carries at least one line while it exists; the quantity-update path deletes
//! the order once its last line goes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Order status while it sits locally, before ERP forwarding.
pub const ESTADO_PENDIENTE: &str = "pendiente";
/// Order status after the ERP accepted it.
pub const ESTADO_PROCESADO: &str = "procesado";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i32,
    pub usuario_id: i32,
    /// Client code (kunnr) this order belongs to.
    pub kunnr: String,
    /// Delivery-route code captured from the first submitted line.
    pub sortl: String,
    pub fecha: DateTime<Utc>,
    pub estado: String,
    /// 0 until the ERP sync succeeds, 1 afterwards.
    pub sap: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderLine {
    pub id: i32,
    pub pedido_id: i32,
    /// Product code (matnr).
    pub matnr: String,
    /// Product description (arktx).
    pub arktx: Option<String>,
    pub cantidad: i32,
    pub precio: Option<f64>,
}

/// Order plus its lines, the shape returned by the detail endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: Order,
    pub detalles: Vec<OrderLine>,
}

/// Listing shape: order, lines, and the client names resolved from the
/// directory (empty strings when the view has no match).
#[derive(Debug, Clone, Serialize)]
pub struct OrderForUser {
    #[serde(flatten)]
    pub order: Order,
    pub detalles: Vec<OrderLine>,
    pub name1: String,
    pub name2: String,
}

/// One submitted line item. `kunnr` decides which order the line lands in.
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrderLine {
    pub kunnr: String,
    pub matnr: String,
    pub arktx: Option<String>,
    pub cantidad: i32,
    pub precio: Option<f64>,
    pub sortl: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub usuario_id: Option<i32>,
    #[serde(default)]
    pub productos: Vec<NewOrderLine>,
}

#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub message: String,
    pub pedidos: Vec<Order>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuantityUpdate {
    pub matnr: String,
    pub cantidad: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantitiesRequest {
    #[serde(default)]
    pub productos: Vec<QuantityUpdate>,
}
