//! Client directory adapter.
//!
//! Read-only queries over the externally maintained `clientes_view` (the view
//! is replicated from the ERP), keyed by client code (kunnr) or group code
//! (detalle_grupo), plus the user-to-client association lookup both the admin
//! surface and the suggestion engine start from.

use std::collections::HashMap;

use crate::api::error::ApiError;
use crate::db::{ClientName, ClientRecord, DbPool};

/// Client codes associated with a user, in association order
pub async fn associated_codes(pool: &DbPool, usuario_id: i32) -> Result<Vec<String>, ApiError> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT kunnr FROM usuario_clientes WHERE usuario_id = $1 ORDER BY id")
            .bind(usuario_id)
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(k,)| k).collect())
}

/// Map from client code to its two name fields. Codes missing from the view
/// are simply absent; callers substitute empty strings.
pub async fn names_for_codes(
    pool: &DbPool,
    codes: &[String],
) -> Result<HashMap<String, (String, String)>, ApiError> {
    if codes.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, ClientName>(
        "SELECT kunnr, name1, name2 FROM clientes_view WHERE kunnr = ANY($1)",
    )
    .bind(codes)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|c| {
            (
                c.kunnr,
                (c.name1.unwrap_or_default(), c.name2.unwrap_or_default()),
            )
        })
        .collect())
}

/// Full directory records for the given client codes
pub async fn records_for_codes(
    pool: &DbPool,
    codes: &[String],
) -> Result<Vec<ClientRecord>, ApiError> {
    if codes.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, ClientRecord>(
        "SELECT kunnr, name1, name2, sortl, doc_type, detalle_grupo
         FROM clientes_view WHERE kunnr = ANY($1)",
    )
    .bind(codes)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Distinct non-null group codes for the given client codes
pub async fn groups_for_codes(pool: &DbPool, codes: &[String]) -> Result<Vec<String>, ApiError> {
    if codes.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT DISTINCT detalle_grupo FROM clientes_view
         WHERE kunnr = ANY($1) AND detalle_grupo IS NOT NULL",
    )
    .bind(codes)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(g,)| g).collect())
}

/// Client codes sharing any of the given groups, excluding the caller's own
/// codes ("peers")
pub async fn peers_in_groups(
    pool: &DbPool,
    groups: &[String],
    exclude: &[String],
) -> Result<Vec<String>, ApiError> {
    if groups.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT kunnr FROM clientes_view
         WHERE detalle_grupo = ANY($1) AND NOT (kunnr = ANY($2))",
    )
    .bind(groups)
    .bind(exclude)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(k,)| k).collect())
}

/// Resolve page/limit query parameters to a SQL LIMIT/OFFSET window.
/// Defaults: page 1, limit 100; limit is capped at 1000.
pub fn page_window(page: Option<u32>, limit: Option<u32>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(100).clamp(1, 1000);
    let offset = (page as i64 - 1) * limit as i64;
    (limit as i64, offset)
}

/// Case-insensitive substring search over name1/name2/kunnr, ordered by the
/// secondary name field, paginated.
pub async fn search_page(
    pool: &DbPool,
    search: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<ClientRecord>, ApiError> {
    let rows = if search.is_empty() {
        sqlx::query_as::<_, ClientRecord>(
            "SELECT kunnr, name1, name2, sortl, doc_type, detalle_grupo
             FROM clientes_view
             ORDER BY name2 LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?
    } else {
        let pattern = format!("%{}%", search);
        sqlx::query_as::<_, ClientRecord>(
            "SELECT kunnr, name1, name2, sortl, doc_type, detalle_grupo
             FROM clientes_view
             WHERE name1 ILIKE $1 OR name2 ILIKE $1 OR kunnr ILIKE $1
             ORDER BY name2 LIMIT $2 OFFSET $3",
        )
        .bind(&pattern)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?
    };

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_window_defaults() {
        assert_eq!(page_window(None, None), (100, 0));
    }

    #[test]
    fn test_page_window_offset() {
        assert_eq!(page_window(Some(3), Some(25)), (25, 50));
    }

    #[test]
    fn test_page_window_clamps() {
        // Page 0 is treated as page 1; limit is capped.
        assert_eq!(page_window(Some(0), Some(0)), (1, 0));
        assert_eq!(page_window(Some(1), Some(100_000)), (1000, 0));
    }
}
