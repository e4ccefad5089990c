//! Message database operations

use chrono::Utc;
use rusqlite::params;

use super::super::Database;
use super::json_column;
use crate::error::StoreResult;
use crate::models::{MessageEvent, StoredMessage};

impl Database {
    /// Insert a message keyed by its external id.
    ///
    /// Returns `false` when a message with the same id already exists; the
    /// stored row is left untouched.
    pub fn insert_message(&self, event: &MessageEvent) -> StoreResult<bool> {
        let payload = event.payload.to_string();
        let now = Utc::now();

        self.with_conn(|conn| {
            let rows_affected = conn.execute(
                "INSERT INTO messages (message_id, contact_number, contact_name, body, message_type, ts_epoch, ts_date, outbound, owning_user, payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(message_id) DO NOTHING",
                params![
                    event.message_id,
                    event.sender.number,
                    event.sender.name,
                    event.body,
                    event.message_type,
                    event.ts_epoch,
                    event.ts_date,
                    event.outbound,
                    event.sender.owning_user,
                    payload,
                    now,
                ],
            )?;
            Ok(rows_affected > 0)
        })
    }

    /// Newest messages first
    pub fn list_recent_messages(&self, limit: usize) -> StoreResult<Vec<StoredMessage>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT message_id, contact_number, contact_name, body, message_type, ts_epoch, ts_date, outbound, owning_user, payload, created_at
                 FROM messages ORDER BY created_at DESC LIMIT ?1",
            )?;

            let messages = stmt
                .query_map([limit as i64], |row| {
                    Ok(StoredMessage {
                        message_id: row.get(0)?,
                        contact_number: row.get(1)?,
                        contact_name: row.get(2)?,
                        body: row.get(3)?,
                        message_type: row.get(4)?,
                        ts_epoch: row.get(5)?,
                        ts_date: row.get(6)?,
                        outbound: row.get(7)?,
                        owning_user: row.get(8)?,
                        payload: json_column(row.get(9)?),
                        created_at: row.get(10)?,
                    })
                })?
                .filter_map(|r| r.ok())
                .collect();

            Ok(messages)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(id: &str, body: &str) -> MessageEvent {
        MessageEvent::from_payload(json!({
            "number": "5511999",
            "name": "Ana",
            "eventDetails": {"id": id, "body": body, "type": "chat", "t": 1700000000}
        }))
        .unwrap()
    }

    #[test]
    fn test_insert_message() {
        let db = Database::new(":memory:").unwrap();
        assert!(db.insert_message(&event("abc1", "oi")).unwrap());

        let messages = db.list_recent_messages(100).unwrap();
        assert_eq!(messages.len(), 1);

        let stored = &messages[0];
        assert_eq!(stored.message_id, "abc1");
        assert_eq!(stored.contact_number, "5511999");
        assert_eq!(stored.contact_name.as_deref(), Some("Ana"));
        assert_eq!(stored.body.as_deref(), Some("oi"));
        assert_eq!(stored.message_type.as_deref(), Some("chat"));
        assert_eq!(stored.ts_epoch, Some(1700000000));
        assert_eq!(stored.ts_date.timestamp(), 1700000000);
        assert!(!stored.outbound);
        assert_eq!(stored.payload["eventDetails"]["id"], "abc1");
    }

    #[test]
    fn test_duplicate_id_is_ignored_and_first_write_wins() {
        let db = Database::new(":memory:").unwrap();
        assert!(db.insert_message(&event("abc1", "oi")).unwrap());
        assert!(!db.insert_message(&event("abc1", "editado")).unwrap());

        let messages = db.list_recent_messages(100).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body.as_deref(), Some("oi"));
    }

    #[test]
    fn test_list_recent_messages_limit() {
        let db = Database::new(":memory:").unwrap();
        for n in 0..5 {
            db.insert_message(&event(&format!("id{}", n), "oi")).unwrap();
        }

        assert_eq!(db.list_recent_messages(2).unwrap().len(), 2);
        assert_eq!(db.list_recent_messages(100).unwrap().len(), 5);
    }
}
