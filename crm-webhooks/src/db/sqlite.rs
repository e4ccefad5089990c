//! SQLite database - schema definitions and connection management
//!
//! This file contains:
//! - Database struct definition
//! - Connection management (new, disconnected, with_conn)
//! - Schema and dashboard view creation
//!
//! All table operations are in the tables/ subdirectory.

use parking_lot::Mutex;
use rusqlite::Connection;
use std::path::Path;

use crate::error::{StoreError, StoreResult};

/// Main database wrapper. The single connection is shared behind a Mutex;
/// `None` means the store could not be opened at startup.
pub struct Database {
    conn: Option<Mutex<Connection>>,
    unavailable_reason: String,
}

impl Database {
    /// Open the database and initialize schema
    pub fn new(database_url: &str) -> StoreResult<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    log::warn!("Could not create database directory {:?}: {}", parent, e);
                }
            }
        }

        let conn = Connection::open(database_url)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Some(Mutex::new(conn)),
            unavailable_reason: String::new(),
        })
    }

    /// A database handle with no connection. Every call fails with
    /// `StoreError::Unavailable`, so the server keeps answering requests.
    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self {
            conn: None,
            unavailable_reason: reason.into(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Run `f` against the shared connection
    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> StoreResult<T> {
        let conn = self
            .conn
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable(self.unavailable_reason.clone()))?;
        let conn = conn.lock();
        Ok(f(&conn)?)
    }
}

/// Create all tables, indexes and dashboard views
fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;

    // Contacts - one row per number, counter bumped by every webhook
    conn.execute(
        "CREATE TABLE IF NOT EXISTS contacts (
            number TEXT PRIMARY KEY,
            name TEXT,
            owning_user TEXT,
            labels TEXT NOT NULL DEFAULT '[]',
            last_interaction TEXT NOT NULL,
            message_count INTEGER NOT NULL DEFAULT 1,
            payload TEXT NOT NULL DEFAULT '{}',
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // Messages - keyed by the platform's message id, first write wins
    conn.execute(
        "CREATE TABLE IF NOT EXISTS messages (
            message_id TEXT PRIMARY KEY,
            contact_number TEXT NOT NULL,
            contact_name TEXT,
            body TEXT,
            message_type TEXT,
            ts_epoch INTEGER,
            ts_date TEXT NOT NULL,
            outbound INTEGER NOT NULL DEFAULT 0,
            owning_user TEXT,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // CRM events - every webhook call is a new row
    conn.execute(
        "CREATE TABLE IF NOT EXISTS crm_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            contact_number TEXT NOT NULL,
            contact_name TEXT,
            event_type TEXT,
            event_name TEXT,
            labels TEXT NOT NULL DEFAULT '[]',
            owning_user TEXT,
            payload TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_messages_contact ON messages(contact_number)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_messages_ts_date ON messages(ts_date)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_crm_events_contact ON crm_events(contact_number)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_contacts_message_count ON contacts(message_count)",
        [],
    )?;

    // Dashboard: totals per owning user. `IS` so rows without a user group together.
    conn.execute(
        "CREATE VIEW IF NOT EXISTS vw_resumo_usuario AS
         WITH users AS (
             SELECT owning_user FROM messages
             UNION SELECT owning_user FROM crm_events
             UNION SELECT owning_user FROM contacts
         )
         SELECT
             u.owning_user AS owning_user,
             (SELECT COUNT(*) FROM messages m WHERE m.owning_user IS u.owning_user) AS total_messages,
             (SELECT COUNT(*) FROM messages m WHERE m.owning_user IS u.owning_user AND m.outbound = 1) AS sent_messages,
             (SELECT COUNT(*) FROM messages m WHERE m.owning_user IS u.owning_user AND m.outbound = 0) AS received_messages,
             (SELECT COUNT(*) FROM contacts c WHERE c.owning_user IS u.owning_user) AS total_contacts,
             (SELECT COUNT(*) FROM crm_events e WHERE e.owning_user IS u.owning_user) AS total_crm_events,
             (SELECT MAX(m.ts_date) FROM messages m WHERE m.owning_user IS u.owning_user) AS last_message_at
         FROM users u",
        [],
    )?;

    // Dashboard: per-day message totals over the last 30 days
    conn.execute(
        "CREATE VIEW IF NOT EXISTS vw_metricas_30dias AS
         SELECT
             date(ts_date) AS day,
             COUNT(*) AS total_messages,
             SUM(CASE WHEN outbound = 1 THEN 1 ELSE 0 END) AS sent_messages,
             SUM(CASE WHEN outbound = 0 THEN 1 ELSE 0 END) AS received_messages,
             COUNT(DISTINCT contact_number) AS unique_contacts
         FROM messages
         WHERE date(ts_date) >= date('now', '-30 days')
         GROUP BY date(ts_date)",
        [],
    )?;

    // Dashboard: contacts ranked by interaction count
    conn.execute(
        "CREATE VIEW IF NOT EXISTS vw_top_contatos AS
         SELECT number, name, owning_user, labels, message_count, last_interaction
         FROM contacts",
        [],
    )?;

    Ok(())
}
