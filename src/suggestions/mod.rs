//! "Frequently bought by peer clients" suggestion engine.
//!
//! Three-hop join: the user's client codes resolve to group codes, the groups
//! resolve to peer clients, and the peers' purchase history is aggregated
//! client-side, excluding everything the user already buys. Product codes are
//! compared only after leading-zero normalization.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::api::error::ApiError;
use crate::clients;
use crate::db::DbPool;
use crate::history::{strip_leading_zeros, HistoryClient};

/// How many suggestions a caller gets at most
const MAX_SUGGESTIONS: usize = 10;

/// Normalized product codes present in the user's own purchase history
pub fn owned_products(records: &[Value]) -> HashSet<String> {
    records
        .iter()
        .filter_map(|r| r.get("matnr").and_then(Value::as_str))
        .map(|m| strip_leading_zeros(m).to_string())
        .collect()
}

fn quantity_of(record: &Value) -> f64 {
    match record.get("qty") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(1.0),
        Some(Value::String(s)) => s.parse().unwrap_or(1.0),
        _ => 1.0,
    }
}

fn total_value(total: f64) -> Value {
    if total.fract() == 0.0 {
        Value::from(total as i64)
    } else {
        Value::from(total)
    }
}

/// Aggregate peer purchase records into suggestions.
///
/// Records whose normalized code the user already purchased are skipped.
/// The first record seen for a code is kept as the representative (matnr
/// rewritten to its normalized form); `total` accumulates the quantity of
/// every contributing record. Result is sorted by descending total and capped
/// at ten entries.
pub fn aggregate_peer_history(records: Vec<Value>, owned: &HashSet<String>) -> Vec<Value> {
    let mut order: Vec<String> = Vec::new();
    let mut representatives: HashMap<String, Value> = HashMap::new();
    let mut totals: HashMap<String, f64> = HashMap::new();

    for record in records {
        let Some(matnr) = record.get("matnr").and_then(Value::as_str) else {
            continue;
        };
        let normalized = strip_leading_zeros(matnr).to_string();
        if owned.contains(&normalized) {
            continue;
        }

        let qty = quantity_of(&record);
        if !representatives.contains_key(&normalized) {
            let mut representative = record;
            representative["matnr"] = Value::String(normalized.clone());
            representatives.insert(normalized.clone(), representative);
            order.push(normalized.clone());
        }
        *totals.entry(normalized).or_insert(0.0) += qty;
    }

    let mut suggestions: Vec<(f64, Value)> = order
        .into_iter()
        .map(|code| {
            let total = totals[&code];
            let mut entry = representatives.remove(&code).unwrap_or(Value::Null);
            entry["total"] = total_value(total);
            (total, entry)
        })
        .collect();

    // Stable sort keeps first-seen order among equal totals.
    suggestions.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    suggestions
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, entry)| entry)
        .collect()
}

/// Suggestions for a user: what peer clients in the same groups buy that the
/// user does not. Any empty hop short-circuits to an empty result.
pub async fn suggest_for_user(
    pool: &DbPool,
    history: &HistoryClient,
    usuario_id: i32,
) -> Result<Vec<Value>, ApiError> {
    let codes = clients::associated_codes(pool, usuario_id).await?;
    if codes.is_empty() {
        return Ok(Vec::new());
    }

    let groups = clients::groups_for_codes(pool, &codes).await?;
    if groups.is_empty() {
        return Ok(Vec::new());
    }

    let peers = clients::peers_in_groups(pool, &groups, &codes).await?;
    if peers.is_empty() {
        return Ok(Vec::new());
    }

    let peer_history = history.fetch_for_clients(&peers).await?;
    let own_history = history.fetch_for_clients(&codes).await?;
    let owned = owned_products(&own_history);

    Ok(aggregate_peer_history(peer_history, &owned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_peer_product_is_suggested_with_total() {
        // Peer client in the same group bought matnr 0007; the user has not.
        let records = vec![json!({ "kunag": "C2", "matnr": "0007", "qty": 5 })];
        let owned = HashSet::new();

        let suggestions = aggregate_peer_history(records, &owned);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0]["matnr"], json!("7"));
        assert_eq!(suggestions[0]["total"], json!(5));
    }

    #[test]
    fn test_owned_product_is_excluded_after_normalization() {
        let records = vec![json!({ "kunag": "C2", "matnr": "0007", "qty": 5 })];
        // The user's history carried "0007", normalized to "7".
        let owned = owned_products(&[json!({ "matnr": "0007" })]);

        assert!(aggregate_peer_history(records, &owned).is_empty());
    }

    #[test]
    fn test_quantities_accumulate_per_normalized_code() {
        let records = vec![
            json!({ "matnr": "0007", "qty": 5, "arktx": "Leche entera 1L" }),
            json!({ "matnr": "07", "qty": 3 }),
            json!({ "matnr": "7", "qty": 2 }),
        ];

        let suggestions = aggregate_peer_history(records, &HashSet::new());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0]["total"], json!(10));
        // First-seen record is the representative.
        assert_eq!(suggestions[0]["arktx"], json!("Leche entera 1L"));
    }

    #[test]
    fn test_sorted_descending_and_capped_at_ten() {
        let records: Vec<Value> = (1..=15)
            .map(|i| json!({ "matnr": format!("{}", i), "qty": i }))
            .collect();

        let suggestions = aggregate_peer_history(records, &HashSet::new());
        assert_eq!(suggestions.len(), 10);
        assert_eq!(suggestions[0]["total"], json!(15));
        assert_eq!(suggestions[9]["total"], json!(6));
    }

    #[test]
    fn test_missing_or_stringly_qty() {
        let records = vec![
            json!({ "matnr": "1" }),
            json!({ "matnr": "1", "qty": "2.5" }),
        ];

        let suggestions = aggregate_peer_history(records, &HashSet::new());
        assert_eq!(suggestions[0]["total"], json!(3.5));
    }

    #[test]
    fn test_records_without_matnr_are_skipped() {
        let records = vec![json!({ "qty": 4 }), json!({ "matnr": "9", "qty": 1 })];
        let suggestions = aggregate_peer_history(records, &HashSet::new());
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0]["matnr"], json!("9"));
    }

    #[test]
    fn test_owned_products_normalizes() {
        let owned = owned_products(&[
            json!({ "matnr": "000123" }),
            json!({ "matnr": "45" }),
            json!({ "no_matnr": true }),
        ]);
        assert!(owned.contains("123"));
        assert!(owned.contains("45"));
        assert_eq!(owned.len(), 2);
    }
}
