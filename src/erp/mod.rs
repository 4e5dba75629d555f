//! ERP sync adapter.
//!
//! Forwards a finalized order payload to the external ERP endpoint with the
//! caller's bearer credential attached, then reconciles the local order row
//! from the response. No retries; the caller decides whether to re-submit.

use axum::http::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::api::error::ApiError;
use crate::db::{DbPool, ESTADO_PROCESADO};

/// Response-body key the ERP uses to report a business-level rejection
pub const BUSINESS_ERROR_KEY: &str = "Error en pedido SAP";

/// Failure modes of an ERP forward
#[derive(Error, Debug)]
pub enum SyncError {
    /// The ERP processed the request but rejected the order
    #[error("ERP rejected the order")]
    Business { detail: Value },

    /// The ERP answered with a non-success status and no business detail
    #[error("ERP returned HTTP {status}")]
    Http { status: StatusCode, body: Value },

    /// The ERP could not be reached at all
    #[error("ERP unreachable: {0}")]
    Unreachable(String),
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Business { detail } => ApiError::remote_business(BUSINESS_ERROR_KEY, detail),
            SyncError::Http { status, body } => {
                ApiError::remote_unavailable(format!("ERP returned HTTP {}", status))
                    .with_status(StatusCode::BAD_REQUEST)
                    .with_detail(body)
            }
            SyncError::Unreachable(detail) => {
                ApiError::remote_unavailable(format!("Failed to reach ERP: {}", detail))
            }
        }
    }
}

/// Extract the ERP's business-level error from a response body, if any.
/// A null value under the key counts as no error.
pub fn business_error(body: &Value) -> Option<Value> {
    match body.get(BUSINESS_ERROR_KEY) {
        Some(Value::Null) | None => None,
        Some(detail) => Some(detail.clone()),
    }
}

/// HTTP client for the external ERP gateway
pub struct ErpClient {
    endpoint: String,
    client: reqwest::Client,
}

impl ErpClient {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    /// Forward an order payload, passing the caller's Authorization header
    /// through untouched. Returns the remote body on a clean response.
    pub async fn forward_order(
        &self,
        payload: &Value,
        authorization: Option<&str>,
    ) -> Result<Value, SyncError> {
        let mut request = self.client.post(&self.endpoint).json(payload);
        if let Some(token) = authorization {
            request = request.header("Authorization", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        // The business key wins regardless of status: the ERP reports order
        // rejections in the body of both 200s and error responses.
        if let Some(detail) = business_error(&body) {
            return Err(SyncError::Business { detail });
        }

        if !status.is_success() {
            return Err(SyncError::Http { status, body });
        }

        Ok(body)
    }
}

/// Forward an order to the ERP and, on a clean response, mark the local order
/// (named by the payload's `pedido_id`) as processed. On any failure the
/// local row is left untouched.
pub async fn sync_order(
    pool: &DbPool,
    erp: &ErpClient,
    payload: &Value,
    authorization: Option<&str>,
) -> Result<Value, ApiError> {
    let body = erp.forward_order(payload, authorization).await?;

    match payload.get("pedido_id").and_then(Value::as_i64) {
        Some(order_id) => {
            sqlx::query("UPDATE pedidos SET estado = $1, sap = 1 WHERE id = $2")
                .bind(ESTADO_PROCESADO)
                .bind(order_id as i32)
                .execute(pool)
                .await?;
            tracing::info!(order_id, "Order accepted by ERP and marked processed");
        }
        None => {
            tracing::warn!("ERP payload carried no pedido_id; local state not updated");
        }
    }

    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_business_error_present() {
        let body = json!({ "Error en pedido SAP": "Cliente bloqueado" });
        assert_eq!(business_error(&body), Some(json!("Cliente bloqueado")));
    }

    #[test]
    fn test_business_error_absent() {
        assert_eq!(business_error(&json!({ "ok": true })), None);
        assert_eq!(business_error(&Value::Null), None);
    }

    #[test]
    fn test_business_error_null_value_is_no_error() {
        let body = json!({ "Error en pedido SAP": null });
        assert_eq!(business_error(&body), None);
    }

    #[test]
    fn test_sync_error_mapping() {
        let err: ApiError = SyncError::Business {
            detail: json!("Cliente bloqueado"),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = SyncError::Http {
            status: StatusCode::BAD_GATEWAY,
            body: json!({"message": "upstream down"}),
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = SyncError::Unreachable("connection refused".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
