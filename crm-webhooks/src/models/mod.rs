mod contact;
mod crm_event;
mod message;
pub mod webhook;

pub use contact::Contact;
pub use crm_event::StoredCrmEvent;
pub use message::StoredMessage;
pub use webhook::{CrmEvent, EventKind, MessageEvent, Sender, WebhookEvent};
