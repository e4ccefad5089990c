//! Contact database operations

use chrono::Utc;
use rusqlite::params;
use serde_json::Value;

use super::super::Database;
use super::{json_column, labels_column};
use crate::error::StoreResult;
use crate::models::{Contact, Sender};

impl Database {
    /// Insert a contact or, if the number exists, refresh it and bump its
    /// interaction counter. The increment happens inside the statement so
    /// concurrent webhooks for the same number never lose a count.
    ///
    /// Fields missing from the payload (name, user, labels) keep their stored value.
    pub fn upsert_contact(&self, sender: &Sender, payload: &Value) -> StoreResult<()> {
        let labels = sender.labels.as_ref().map(serde_json::to_string).transpose()?;
        let payload = payload.to_string();
        let now = Utc::now();

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO contacts (number, name, owning_user, labels, last_interaction, message_count, payload, created_at)
                 VALUES (?1, ?2, ?3, COALESCE(?4, '[]'), ?5, 1, ?6, ?5)
                 ON CONFLICT(number) DO UPDATE SET
                     name = COALESCE(excluded.name, contacts.name),
                     owning_user = COALESCE(excluded.owning_user, contacts.owning_user),
                     labels = COALESCE(?4, contacts.labels),
                     last_interaction = excluded.last_interaction,
                     message_count = contacts.message_count + 1,
                     payload = excluded.payload",
                params![sender.number, sender.name, sender.owning_user, labels, now, payload],
            )?;
            Ok(())
        })
    }

    /// Most recently active contacts first
    pub fn list_recent_contacts(&self, limit: usize) -> StoreResult<Vec<Contact>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT number, name, owning_user, labels, last_interaction, message_count, payload, created_at
                 FROM contacts ORDER BY last_interaction DESC LIMIT ?1",
            )?;

            let contacts = stmt
                .query_map([limit as i64], |row| {
                    Ok(Contact {
                        number: row.get(0)?,
                        name: row.get(1)?,
                        owning_user: row.get(2)?,
                        labels: labels_column(row.get(3)?),
                        last_interaction: row.get(4)?,
                        message_count: row.get(5)?,
                        payload: json_column(row.get(6)?),
                        created_at: row.get(7)?,
                    })
                })?
                .filter_map(|r| r.ok())
                .collect();

            Ok(contacts)
        })
    }
}
