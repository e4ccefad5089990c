//! CRM event database operations

use chrono::Utc;
use rusqlite::params;

use super::super::Database;
use super::{json_column, labels_column};
use crate::error::StoreResult;
use crate::models::{CrmEvent, StoredCrmEvent};

impl Database {
    /// Insert a CRM event. There is no dedup key: every call adds a row.
    pub fn insert_crm_event(&self, event: &CrmEvent) -> StoreResult<i64> {
        let labels = serde_json::to_string(event.sender.labels.as_deref().unwrap_or_default())?;
        let payload = event.payload.to_string();
        let now = Utc::now();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO crm_events (contact_number, contact_name, event_type, event_name, labels, owning_user, payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    event.sender.number,
                    event.sender.name,
                    event.event_type,
                    event.event_name,
                    labels,
                    event.sender.owning_user,
                    payload,
                    now,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Newest events first
    pub fn list_recent_crm_events(&self, limit: usize) -> StoreResult<Vec<StoredCrmEvent>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, contact_number, contact_name, event_type, event_name, labels, owning_user, payload, created_at
                 FROM crm_events ORDER BY id DESC LIMIT ?1",
            )?;

            let events = stmt
                .query_map([limit as i64], |row| {
                    Ok(StoredCrmEvent {
                        id: row.get(0)?,
                        contact_number: row.get(1)?,
                        contact_name: row.get(2)?,
                        event_type: row.get(3)?,
                        event_name: row.get(4)?,
                        labels: labels_column(row.get(5)?),
                        owning_user: row.get(6)?,
                        payload: json_column(row.get(7)?),
                        created_at: row.get(8)?,
                    })
                })?
                .filter_map(|r| r.ok())
                .collect();

            Ok(events)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event() -> CrmEvent {
        CrmEvent::from_payload(json!({
            "number": "5511888",
            "name": "Bruno",
            "user": "gerente",
            "labels": ["quente"],
            "eventDetails": {"type": "label_added", "name": "Etiqueta adicionada"}
        }))
        .unwrap()
    }

    #[test]
    fn test_every_insert_adds_a_row() {
        let db = Database::new(":memory:").unwrap();
        let first = db.insert_crm_event(&event()).unwrap();
        let second = db.insert_crm_event(&event()).unwrap();
        let third = db.insert_crm_event(&event()).unwrap();
        assert!(first < second && second < third);

        let events = db.list_recent_crm_events(100).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].id, third);

        let stored = &events[0];
        assert_eq!(stored.contact_number, "5511888");
        assert_eq!(stored.contact_name.as_deref(), Some("Bruno"));
        assert_eq!(stored.event_type.as_deref(), Some("label_added"));
        assert_eq!(stored.event_name.as_deref(), Some("Etiqueta adicionada"));
        assert_eq!(stored.labels, vec!["quente"]);
        assert_eq!(stored.owning_user.as_deref(), Some("gerente"));
    }

    #[test]
    fn test_missing_labels_store_empty_list() {
        let db = Database::new(":memory:").unwrap();
        let event = CrmEvent::from_payload(json!({"number": "1", "eventDetails": {}})).unwrap();
        db.insert_crm_event(&event).unwrap();

        let events = db.list_recent_crm_events(1).unwrap();
        assert!(events[0].labels.is_empty());
        assert_eq!(events[0].event_type, None);
    }
}
