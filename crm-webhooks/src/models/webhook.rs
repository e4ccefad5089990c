//! Inbound webhook payloads from the messaging/CRM platform.
//!
//! Payloads arrive as loosely shaped JSON. They are parsed here, at the HTTP
//! boundary, into a [`WebhookEvent`] so the recorders only ever see typed data.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::str::FromStr;
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::error::PayloadError;

/// Field the dispatcher writes its routing tag into
pub const EVENT_KIND_FIELD: &str = "eventID";
/// Receipt timestamp added to every payload before it is logged
pub const RECEIVED_AT_FIELD: &str = "receivedAt";
pub const EVENT_DETAILS_FIELD: &str = "eventDetails";

/// Which recorder a payload belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum EventKind {
    #[strum(to_string = "messages", serialize = "message", serialize = "mensagens")]
    Messages,
    #[strum(to_string = "crm")]
    Crm,
}

/// The contact a webhook is about
#[derive(Debug, Clone, PartialEq)]
pub struct Sender {
    pub number: String,
    pub name: Option<String>,
    pub owning_user: Option<String>,
    /// `None` when the payload carries no labels at all
    pub labels: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct MessageEvent {
    pub sender: Sender,
    pub message_id: String,
    pub body: Option<String>,
    pub message_type: Option<String>,
    pub ts_epoch: Option<i64>,
    pub ts_date: DateTime<Utc>,
    pub outbound: bool,
    pub payload: Value,
}

#[derive(Debug, Clone)]
pub struct CrmEvent {
    pub sender: Sender,
    pub event_type: Option<String>,
    pub event_name: Option<String>,
    pub payload: Value,
}

#[derive(Debug, Clone)]
pub enum WebhookEvent {
    Message(MessageEvent),
    Crm(CrmEvent),
    /// Routing key missing or unrecognized, or no event details to record
    Unknown,
}

impl WebhookEvent {
    /// Classify a generic payload by its routing key.
    ///
    /// Only payloads with a recognized kind and an `eventDetails` object are
    /// routed; everything else is `Unknown` and is not persisted.
    pub fn classify(payload: Value) -> Result<Self, PayloadError> {
        let Some(kind) = routing_kind(&payload) else {
            return Ok(Self::Unknown);
        };
        if !payload.get(EVENT_DETAILS_FIELD).is_some_and(Value::is_object) {
            return Ok(Self::Unknown);
        }

        match kind {
            EventKind::Messages => MessageEvent::from_payload(payload).map(Self::Message),
            EventKind::Crm => CrmEvent::from_payload(payload).map(Self::Crm),
        }
    }

    pub fn kind(&self) -> Option<EventKind> {
        match self {
            Self::Message(_) => Some(EventKind::Messages),
            Self::Crm(_) => Some(EventKind::Crm),
            Self::Unknown => None,
        }
    }
}

impl MessageEvent {
    pub fn from_payload(payload: Value) -> Result<Self, PayloadError> {
        let object = payload.as_object().ok_or(PayloadError::NotAnObject)?;
        let sender = Sender::from_object(object)?;
        let details = event_details(object)?;

        let ts_epoch = details
            .get("t")
            .or_else(|| details.get("timestamp"))
            .and_then(value_as_i64);
        let ts_date = ts_epoch
            .and_then(|t| DateTime::from_timestamp(t, 0))
            .unwrap_or_else(Utc::now);

        let outbound = details
            .get("fromMe")
            .or_else(|| details.get("id").and_then(|id| id.get("fromMe")))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(Self {
            message_id: extract_message_id(details).unwrap_or_else(generate_message_id),
            body: string_field(details, "body"),
            message_type: string_field(details, "type"),
            ts_epoch,
            ts_date,
            outbound,
            sender,
            payload,
        })
    }
}

impl CrmEvent {
    pub fn from_payload(payload: Value) -> Result<Self, PayloadError> {
        let object = payload.as_object().ok_or(PayloadError::NotAnObject)?;
        let sender = Sender::from_object(object)?;
        let details = event_details(object)?;

        Ok(Self {
            event_type: string_field(details, "type"),
            event_name: string_field(details, "name"),
            sender,
            payload,
        })
    }
}

impl Sender {
    fn from_object(object: &Map<String, Value>) -> Result<Self, PayloadError> {
        let number = object
            .get("number")
            .and_then(value_as_string)
            .ok_or(PayloadError::MissingField("number"))?;

        Ok(Self {
            number,
            name: string_field(object, "name"),
            owning_user: string_field(object, "user").or_else(|| string_field(object, "userName")),
            labels: object.get("labels").filter(|v| !v.is_null()).map(normalize_labels),
        })
    }
}

/// Parse a raw request body. Anything but a JSON object is rejected.
pub fn parse_body(body: &[u8]) -> Result<Value, PayloadError> {
    let value: Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(PayloadError::NotAnObject);
    }
    Ok(value)
}

/// Overwrite the routing tag with `kind`
pub fn tag_payload(payload: &mut Value, kind: EventKind) {
    if let Some(object) = payload.as_object_mut() {
        object.insert(EVENT_KIND_FIELD.to_string(), Value::String(kind.to_string()));
    }
}

/// Add a receipt timestamp under `field`
pub fn stamp(payload: &mut Value, field: &str, at: DateTime<Utc>) {
    if let Some(object) = payload.as_object_mut() {
        object.insert(field.to_string(), Value::String(at.to_rfc3339()));
    }
}

/// Find the routing key, tolerating `eventID`, `eventId`, `event_id`, etc.
pub fn routing_kind(payload: &Value) -> Option<EventKind> {
    payload
        .as_object()?
        .iter()
        .find(|(key, _)| {
            let key = key.to_ascii_lowercase();
            key == "eventid" || key == "event_id"
        })
        .and_then(|(_, value)| value.as_str())
        .and_then(|raw| EventKind::from_str(raw.trim()).ok())
}

fn event_details(object: &Map<String, Value>) -> Result<&Map<String, Value>, PayloadError> {
    object
        .get(EVENT_DETAILS_FIELD)
        .and_then(Value::as_object)
        .ok_or(PayloadError::MissingField(EVENT_DETAILS_FIELD))
}

/// The external message id. WhatsApp ids show up either as a plain string, as
/// an object carrying `_serialized`/`id`, or flattened onto the details.
fn extract_message_id(details: &Map<String, Value>) -> Option<String> {
    let nested = details.get("id").and_then(|id| match id {
        Value::Object(parts) => parts
            .get("_serialized")
            .and_then(value_as_string)
            .or_else(|| parts.get("id").and_then(value_as_string)),
        other => value_as_string(other),
    });

    nested
        .or_else(|| details.get("_serialized").and_then(value_as_string))
        .or_else(|| details.get("id_serialized").and_then(value_as_string))
}

fn generate_message_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("msg_{}_{}", Utc::now().timestamp_millis(), &suffix[..8])
}

/// Labels come as plain strings or as objects with a `name`
fn normalize_labels(value: &Value) -> Vec<String> {
    let Some(items) = value.as_array() else {
        return value_as_string(value).into_iter().collect();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(label) => label.get("name").and_then(value_as_string),
            other => value_as_string(other),
        })
        .collect()
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(value_as_string)
}

/// Non-empty string, or a number rendered as text
fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
