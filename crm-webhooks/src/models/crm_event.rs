use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the `crm_events` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCrmEvent {
    pub id: i64,
    pub contact_number: String,
    pub contact_name: Option<String>,
    pub event_type: Option<String>,
    pub event_name: Option<String>,
    pub labels: Vec<String>,
    pub owning_user: Option<String>,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
