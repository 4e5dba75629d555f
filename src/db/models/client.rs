//! Rows from the externally maintained `clientes_view`.
//!
//! The view is fed by the ERP replication job; this crate only ever reads it.

use serde::Serialize;
use sqlx::FromRow;

/// Full client record as exposed to the admin UI.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ClientRecord {
    pub kunnr: String,
    pub name1: Option<String>,
    pub name2: Option<String>,
    pub sortl: Option<String>,
    pub doc_type: Option<String>,
    pub detalle_grupo: Option<String>,
}

/// Name fields only, for enriching order listings.
#[derive(Debug, Clone, FromRow)]
pub struct ClientName {
    pub kunnr: String,
    pub name1: Option<String>,
    pub name2: Option<String>,
}
