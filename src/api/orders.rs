//! /pedidos endpoints: order capture, listing, quantity updates and ERP
//! forwarding.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::db::{
    CreateOrderRequest, CreateOrderResponse, OrderForUser, OrderWithLines,
    UpdateQuantitiesRequest,
};
use crate::erp;
use crate::orders::{self, UpdateOutcome};
use crate::AppState;

use super::error::ApiError;

/// Create one order per distinct client code in the submission
pub async fn create_orders(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<CreateOrderResponse>), ApiError> {
    let pedidos = orders::create_orders(&state.db, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateOrderResponse {
            message: "Order(s) registered".to_string(),
            pedidos,
        }),
    ))
}

/// All orders for a user, enriched with client names
pub async fn list_orders_for_user(
    State(state): State<Arc<AppState>>,
    Path(usuario_id): Path<i32>,
) -> Result<Json<Vec<OrderForUser>>, ApiError> {
    let result = orders::list_orders_for_user(&state.db, usuario_id).await?;
    Ok(Json(result))
}

/// One order with its lines
pub async fn order_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<OrderWithLines>, ApiError> {
    let detail = orders::get_order_detail(&state.db, id).await?;
    Ok(Json(detail))
}

/// Update line quantities; zero removes a line, and an order left with no
/// lines is removed entirely
pub async fn update_quantities(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateQuantitiesRequest>,
) -> Result<Json<Value>, ApiError> {
    let outcome = orders::update_quantities(&state.db, id, &request.productos).await?;

    let message = match outcome {
        UpdateOutcome::OrderDeleted => "All products removed, order deleted",
        UpdateOutcome::QuantitiesUpdated => "Quantities updated successfully",
    };
    Ok(Json(serde_json::json!({ "message": message })))
}

/// Delete an order and its lines
pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    orders::delete_order(&state.db, id).await?;
    Ok(Json(serde_json::json!({ "message": "Order deleted" })))
}

/// Forward a finalized order to the ERP, passing the caller's bearer
/// credential through, and mark the local order processed on success
pub async fn process_erp(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let authorization = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let data = erp::sync_order(&state.db, &state.erp, &payload, authorization).await?;

    Ok(Json(serde_json::json!({
        "message": "Order processed by ERP",
        "data": data
    })))
}
