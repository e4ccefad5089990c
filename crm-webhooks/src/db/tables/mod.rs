//! Table modules - extend Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

mod contacts;   // contacts (upsert + listing)
mod crm_events; // crm_events
pub(crate) mod dashboard; // vw_resumo_usuario, vw_metricas_30dias, vw_top_contatos
mod messages;   // messages (idempotent insert)

use serde_json::Value;

/// Decode a JSON text column, keeping the raw text if it is not valid JSON
fn json_column(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

/// Decode a labels column stored as a JSON array of strings
fn labels_column(raw: String) -> Vec<String> {
    serde_json::from_str(&raw).unwrap_or_default()
}
