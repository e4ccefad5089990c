use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A contact as stored in the `contacts` table, one row per number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub number: String,
    pub name: Option<String>,
    pub owning_user: Option<String>,
    pub labels: Vec<String>,
    pub last_interaction: DateTime<Utc>,
    /// Messages plus CRM events seen for this number
    pub message_count: i64,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
