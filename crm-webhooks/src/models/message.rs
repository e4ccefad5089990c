use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row of the `messages` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub message_id: String,
    pub contact_number: String,
    pub contact_name: Option<String>,
    pub body: Option<String>,
    pub message_type: Option<String>,
    pub ts_epoch: Option<i64>,
    pub ts_date: DateTime<Utc>,
    pub outbound: bool,
    pub owning_user: Option<String>,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
