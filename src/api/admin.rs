//! /admin endpoints: user listing and deletion, client association
//! management, client directory search, purchase history and suggestions.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::clients;
use crate::db::{AssociateClientsRequest, ClientRecord, UserPublic};
use crate::history;
use crate::suggestions;
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::validate_client_code;

/// All users, public fields only
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserPublic>>, ApiError> {
    let users = sqlx::query_as::<_, UserPublic>(
        "SELECT id, username, email, role, created_at, lat, lng FROM usuarios ORDER BY id",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(users))
}

/// Replace a user's client associations with the submitted set. The old set
/// is destroyed and the new one created inside one transaction, so a failure
/// leaves the previous associations in place.
pub async fn associate_clients(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
    Json(request): Json<AssociateClientsRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    for code in &request.kunnr {
        if let Err(e) = validate_client_code(code) {
            errors.add("kunnr", format!("{}: {}", code, e));
        }
    }
    errors.finish()?;

    let mut tx = state.db.begin().await?;

    sqlx::query("DELETE FROM usuario_clientes WHERE usuario_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    if !request.kunnr.is_empty() {
        let mut qb =
            sqlx::QueryBuilder::<sqlx::Postgres>::new("INSERT INTO usuario_clientes (usuario_id, kunnr) ");
        qb.push_values(request.kunnr.iter(), |mut b, code| {
            b.push_bind(user_id).push_bind(code);
        });
        qb.build().execute(&mut *tx).await?;
    }

    tx.commit().await?;

    tracing::info!(user_id, count = request.kunnr.len(), "Replaced client associations");
    Ok(Json(serde_json::json!({
        "message": "Clients associated successfully"
    })))
}

/// Full directory records for a user's associated clients
pub async fn list_clients_for_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<ClientRecord>>, ApiError> {
    let codes = clients::associated_codes(&state.db, user_id).await?;
    if codes.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let records = clients::records_for_codes(&state.db, &codes).await?;
    Ok(Json(records))
}

/// Delete a user together with its associations, orders and order lines
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let exists: Option<(i32,)> = sqlx::query_as("SELECT id FROM usuarios WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(ApiError::not_found("User not found"));
    }

    let mut tx = state.db.begin().await?;
    sqlx::query(
        "DELETE FROM pedido_detalle
         WHERE pedido_id IN (SELECT id FROM pedidos WHERE usuario_id = $1)",
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query("DELETE FROM pedidos WHERE usuario_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM usuario_clientes WHERE usuario_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM usuarios WHERE id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(user_id, "Deleted user and dependents");
    Ok(Json(serde_json::json!({ "message": "User deleted" })))
}

#[derive(Debug, Deserialize)]
pub struct ClientSearchQuery {
    #[serde(default)]
    pub search: String,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Paginated, case-insensitive search over the client directory
pub async fn list_all_clients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ClientSearchQuery>,
) -> Result<Json<Vec<ClientRecord>>, ApiError> {
    let (limit, offset) = clients::page_window(query.page, query.limit);
    let records = clients::search_page(&state.db, &query.search, limit, offset).await?;
    Ok(Json(records))
}

/// Purchase history filtered to the user's associated clients, product codes
/// normalized
pub async fn user_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let codes = clients::associated_codes(&state.db, user_id).await?;
    if codes.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let records = state.history.fetch_all().await?;
    Ok(Json(history::filter_for_user(records, &codes)))
}

/// Peer-group purchase suggestions for a user
pub async fn group_suggestions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let result = suggestions::suggest_for_user(&state.db, &state.history, user_id).await?;
    Ok(Json(result))
}
