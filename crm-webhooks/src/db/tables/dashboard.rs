//! Dashboard view queries
//!
//! Views are returned as raw rows: one JSON object per row, keyed by column name.

use rusqlite::types::ValueRef;
use rusqlite::{Connection, Params};
use serde_json::{Map, Number, Value};

use super::super::Database;
use crate::error::StoreResult;

pub const DEFAULT_TOP_CONTACTS_LIMIT: i64 = 50;

impl Database {
    /// Per-user totals, busiest users first
    pub fn dashboard_user_summary(&self) -> StoreResult<Vec<Value>> {
        self.with_conn(|conn| {
            query_json_rows(
                conn,
                "SELECT * FROM vw_resumo_usuario ORDER BY total_messages DESC, owning_user",
                [],
            )
        })
    }

    /// Daily message totals for the last 30 days, newest day first
    pub fn dashboard_metrics_30_days(&self) -> StoreResult<Vec<Value>> {
        self.with_conn(|conn| {
            query_json_rows(conn, "SELECT * FROM vw_metricas_30dias ORDER BY day DESC", [])
        })
    }

    /// Contacts with the most interactions
    pub fn dashboard_top_contacts(&self, limit: i64) -> StoreResult<Vec<Value>> {
        self.with_conn(|conn| {
            query_json_rows(
                conn,
                "SELECT * FROM vw_top_contatos ORDER BY message_count DESC, last_interaction DESC LIMIT ?1",
                [limit],
            )
        })
    }
}

fn query_json_rows<P: Params>(conn: &Connection, sql: &str, params: P) -> rusqlite::Result<Vec<Value>> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let rows = stmt.query_map(params, |row| {
        let mut object = Map::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            object.insert(name.clone(), column_to_json(row.get_ref(idx)?));
        }
        Ok(Value::Object(object))
    })?;

    rows.collect()
}

fn column_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}
