//! Client for the external purchase-history feed.
//!
//! The feed is a SQL-over-HTTP gateway: POST a query plus the target database
//! coordinates, get the rows back as a JSON array. Product codes (matnr) come
//! back zero-padded from the ERP and are normalized before any comparison.

use serde_json::{json, Value};

use crate::api::error::ApiError;
use crate::config::HistoryConfig;

/// Strip leading zeros from a product code. An all-zero code normalizes to
/// the empty string.
pub fn strip_leading_zeros(code: &str) -> &str {
    code.trim_start_matches('0')
}

/// Render client codes as a quoted SQL IN list, escaping embedded quotes
fn quoted_in_list(codes: &[String]) -> String {
    codes
        .iter()
        .map(|c| format!("'{}'", c.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Keep only the records belonging to the given client codes (as sold-to
/// `kunag` or payer `kunrg`), normalizing each record's matnr in place.
pub fn filter_for_user(records: Vec<Value>, codes: &[String]) -> Vec<Value> {
    records
        .into_iter()
        .filter(|record| {
            let matches = |field: &str| {
                record
                    .get(field)
                    .and_then(Value::as_str)
                    .map(|v| codes.iter().any(|c| c == v))
                    .unwrap_or(false)
            };
            matches("kunag") || matches("kunrg")
        })
        .map(|mut record| {
            if let Some(matnr) = record.get("matnr").and_then(Value::as_str) {
                let normalized = strip_leading_zeros(matnr).to_string();
                record["matnr"] = Value::String(normalized);
            }
            record
        })
        .collect()
}

/// HTTP client for the purchase-history gateway
pub struct HistoryClient {
    endpoint: String,
    db_host: String,
    db_name: String,
    client: reqwest::Client,
}

impl HistoryClient {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            db_host: config.db_host.clone(),
            db_name: config.db_name.clone(),
            client: reqwest::Client::new(),
        }
    }

    async fn select(&self, query: &str) -> Result<Vec<Value>, ApiError> {
        let body = json!({
            "query": query,
            "db": { "host": self.db_host, "database": self.db_name }
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ApiError::remote_unavailable(format!("Failed to reach history feed: {}", e))
            })?;

        if !response.status().is_success() {
            return Err(ApiError::remote_unavailable(format!(
                "History feed returned HTTP {}",
                response.status()
            )));
        }

        response.json::<Vec<Value>>().await.map_err(|e| {
            ApiError::remote_unavailable(format!("Invalid history feed response: {}", e))
        })
    }

    /// Full purchase-history dump
    pub async fn fetch_all(&self) -> Result<Vec<Value>, ApiError> {
        self.select("SELECT * FROM historial_compras_cli;").await
    }

    /// Purchase-history records for the given sold-to client codes
    pub async fn fetch_for_clients(&self, codes: &[String]) -> Result<Vec<Value>, ApiError> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!(
            "SELECT * FROM historial_compras_cli WHERE kunag IN ({})",
            quoted_in_list(codes)
        );
        self.select(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_leading_zeros() {
        assert_eq!(strip_leading_zeros("0007"), "7");
        assert_eq!(strip_leading_zeros("000101306"), "101306");
        assert_eq!(strip_leading_zeros("7"), "7");
        assert_eq!(strip_leading_zeros("700"), "700");
        assert_eq!(strip_leading_zeros("0000"), "");
        assert_eq!(strip_leading_zeros(""), "");
    }

    #[test]
    fn test_quoted_in_list() {
        let codes = vec!["C1".to_string(), "C2".to_string()];
        assert_eq!(quoted_in_list(&codes), "'C1','C2'");
    }

    #[test]
    fn test_quoted_in_list_escapes_quotes() {
        let codes = vec!["O'HARA".to_string()];
        assert_eq!(quoted_in_list(&codes), "'O''HARA'");
    }

    #[test]
    fn test_filter_for_user_matches_kunag_or_kunrg() {
        let records = vec![
            json!({ "kunag": "C1", "kunrg": "X", "matnr": "0007" }),
            json!({ "kunag": "X", "kunrg": "C1", "matnr": "0008" }),
            json!({ "kunag": "X", "kunrg": "Y", "matnr": "0009" }),
        ];
        let codes = vec!["C1".to_string()];

        let filtered = filter_for_user(records, &codes);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0]["matnr"], json!("7"));
        assert_eq!(filtered[1]["matnr"], json!("8"));
    }

    #[test]
    fn test_filter_for_user_empty_codes() {
        let records = vec![json!({ "kunag": "C1", "matnr": "0007" })];
        assert!(filter_for_user(records, &[]).is_empty());
    }
}
