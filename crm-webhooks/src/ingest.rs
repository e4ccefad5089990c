//! Recorders - write parsed webhook events to the store
//!
//! Both recorders always finish with a contact upsert, so the contact counter
//! moves once per webhook even when a message id was already stored.

use std::fmt;

use crate::db::Database;
use crate::error::StoreResult;
use crate::models::{CrmEvent, MessageEvent, WebhookEvent};

/// What a webhook ended up writing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    /// `inserted` is false when the message id was already stored
    Message { message_id: String, inserted: bool },
    CrmEvent { id: i64 },
    /// Unrecognized payload, nothing written
    Skipped,
}

impl fmt::Display for Recorded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message { message_id, inserted: true } => write!(f, "message {} stored", message_id),
            Self::Message { message_id, inserted: false } => write!(f, "message {} duplicate", message_id),
            Self::CrmEvent { id } => write!(f, "crm event {} stored", id),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

pub fn record(db: &Database, event: &WebhookEvent) -> StoreResult<Recorded> {
    match event {
        WebhookEvent::Message(message) => record_message(db, message),
        WebhookEvent::Crm(crm) => record_crm_event(db, crm),
        WebhookEvent::Unknown => {
            log::debug!("Unrecognized webhook payload, nothing persisted");
            Ok(Recorded::Skipped)
        }
    }
}

pub fn record_message(db: &Database, event: &MessageEvent) -> StoreResult<Recorded> {
    let inserted = db.insert_message(event);
    let contact = db.upsert_contact(&event.sender, &event.payload);

    if let (Err(_), Err(e)) = (&inserted, &contact) {
        log::error!("Failed to upsert contact {}: {}", event.sender.number, e);
    }
    let inserted = inserted?;
    contact?;

    if inserted {
        log::info!("Stored message {} from {}", event.message_id, event.sender.number);
    } else {
        log::info!("Message {} already stored, ignoring duplicate", event.message_id);
    }

    Ok(Recorded::Message {
        message_id: event.message_id.clone(),
        inserted,
    })
}

pub fn record_crm_event(db: &Database, event: &CrmEvent) -> StoreResult<Recorded> {
    let id = db.insert_crm_event(event);
    let contact = db.upsert_contact(&event.sender, &event.payload);

    if let (Err(_), Err(e)) = (&id, &contact) {
        log::error!("Failed to upsert contact {}: {}", event.sender.number, e);
    }
    let id = id?;
    contact?;

    log::info!(
        "Stored CRM event {} ({}) for {}",
        id,
        event.event_type.as_deref().unwrap_or("unknown"),
        event.sender.number
    );

    Ok(Recorded::CrmEvent { id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::Contact;
    use serde_json::json;

    fn message(id: &str) -> MessageEvent {
        MessageEvent::from_payload(json!({
            "number": "5511999",
            "name": "Ana",
            "eventDetails": {"id": id, "body": "oi", "type": "chat", "t": 1700000000}
        }))
        .unwrap()
    }

    fn crm() -> CrmEvent {
        CrmEvent::from_payload(json!({
            "number": "5511999",
            "name": "Ana",
            "labels": ["lead"],
            "eventDetails": {"type": "stage_changed", "name": "Negociacao"}
        }))
        .unwrap()
    }

    fn contact(db: &Database) -> Contact {
        db.list_recent_contacts(10).unwrap().remove(0)
    }

    #[test]
    fn test_duplicate_message_still_counts_interaction() {
        let db = Database::new(":memory:").unwrap();

        let first = record_message(&db, &message("abc1")).unwrap();
        assert_eq!(first, Recorded::Message { message_id: "abc1".into(), inserted: true });
        assert_eq!(contact(&db).message_count, 1);

        let second = record_message(&db, &message("abc1")).unwrap();
        assert_eq!(second, Recorded::Message { message_id: "abc1".into(), inserted: false });

        assert_eq!(db.list_recent_messages(100).unwrap().len(), 1);
        assert_eq!(contact(&db).message_count, 2);
    }

    #[test]
    fn test_crm_events_are_never_deduplicated() {
        let db = Database::new(":memory:").unwrap();
        for _ in 0..4 {
            assert!(matches!(record_crm_event(&db, &crm()).unwrap(), Recorded::CrmEvent { .. }));
        }

        assert_eq!(db.list_recent_crm_events(100).unwrap().len(), 4);
        assert_eq!(contact(&db).message_count, 4);
        assert_eq!(contact(&db).labels, vec!["lead"]);
    }

    #[test]
    fn test_counter_tracks_mixed_events() {
        let db = Database::new(":memory:").unwrap();
        record(&db, &WebhookEvent::Message(message("m1"))).unwrap();
        record(&db, &WebhookEvent::Crm(crm())).unwrap();
        record(&db, &WebhookEvent::Message(message("m2"))).unwrap();

        assert_eq!(contact(&db).message_count, 3);
    }

    #[test]
    fn test_unknown_event_writes_nothing() {
        let db = Database::new(":memory:").unwrap();
        assert_eq!(record(&db, &WebhookEvent::Unknown).unwrap(), Recorded::Skipped);

        assert!(db.list_recent_messages(10).unwrap().is_empty());
        assert!(db.list_recent_contacts(10).unwrap().is_empty());
    }

    #[test]
    fn test_recorded_display() {
        let message = Recorded::Message { message_id: "abc1".into(), inserted: false };
        assert_eq!(message.to_string(), "message abc1 duplicate");
        assert_eq!(Recorded::CrmEvent { id: 7 }.to_string(), "crm event 7 stored");
        assert_eq!(Recorded::Skipped.to_string(), "skipped");
    }

    #[test]
    fn test_store_failure_is_reported() {
        let db = Database::disconnected("no store");
        let err = record_message(&db, &message("abc1")).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));

        let err = record_crm_event(&db, &crm()).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
