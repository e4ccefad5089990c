//! Webhook ingestion endpoints
//!
//! Every endpoint answers HTTP 200, even when the payload is broken or the
//! store fails, so the sending platform never starts retrying or backing off.
//! Failures are logged here and reported in the body's `success` flag.

use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use crate::error::IngestError;
use crate::ingest::{self, Recorded};
use crate::models::webhook::{self, RECEIVED_AT_FIELD};
use crate::models::{CrmEvent, EventKind, MessageEvent, WebhookEvent};
use crate::AppState;

/// Receipt timestamp field used by the legacy `/webhook` endpoint
const LEGACY_RECEIVED_AT_FIELD: &str = "recebido_em";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/webhook/mensagens").route(web::post().to(receive_message)));
    cfg.service(web::resource("/webhook/crm").route(web::post().to(receive_crm)));
    cfg.service(web::resource("/webhook/waspeed").route(web::post().to(receive_generic)));
    cfg.service(web::resource("/webhook").route(web::post().to(receive_legacy)));
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tipo: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl WebhookResponse {
    fn processed(message: &'static str, tipo: Option<&'static str>) -> Self {
        Self {
            success: true,
            message: Some(message),
            tipo,
            error: None,
        }
    }

    fn failed(error: &IngestError) -> Self {
        Self {
            success: false,
            message: None,
            tipo: None,
            error: Some(error.to_string()),
        }
    }
}

/// Response shape of the first single-endpoint receiver
#[derive(Debug, Serialize)]
pub struct LegacyWebhookResponse {
    status: &'static str,
    mensagem: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_recebidos: Option<usize>,
}

async fn receive_message(state: web::Data<AppState>, body: web::Bytes) -> impl Responder {
    log::info!("[WEBHOOK] Message received");

    let response = match ingest_typed(&state, &body, EventKind::Messages) {
        Ok(recorded) => {
            log::info!("[WEBHOOK] Processed: {}", recorded);
            WebhookResponse::processed("Webhook de mensagem processado", Some("mensagens"))
        }
        Err(e) => {
            log::error!("[WEBHOOK] Failed to process message webhook: {}", e);
            WebhookResponse::failed(&e)
        }
    };
    HttpResponse::Ok().json(response)
}

async fn receive_crm(state: web::Data<AppState>, body: web::Bytes) -> impl Responder {
    log::info!("[WEBHOOK] CRM event received");

    let response = match ingest_typed(&state, &body, EventKind::Crm) {
        Ok(recorded) => {
            log::info!("[WEBHOOK] Processed: {}", recorded);
            WebhookResponse::processed("Webhook de CRM processado", Some("crm"))
        }
        Err(e) => {
            log::error!("[WEBHOOK] Failed to process CRM webhook: {}", e);
            WebhookResponse::failed(&e)
        }
    };
    HttpResponse::Ok().json(response)
}

async fn receive_generic(state: web::Data<AppState>, body: web::Bytes) -> impl Responder {
    log::info!("[WEBHOOK] Generic webhook received");

    let response = match ingest_routed(&state, &body, RECEIVED_AT_FIELD) {
        Ok(recorded) => {
            log::info!("[WEBHOOK] Processed: {}", recorded);
            WebhookResponse::processed("Webhook processado", None)
        }
        Err(e) => {
            log::error!("[WEBHOOK] Failed to process generic webhook: {}", e);
            WebhookResponse::failed(&e)
        }
    };
    HttpResponse::Ok().json(response)
}

async fn receive_legacy(state: web::Data<AppState>, body: web::Bytes) -> impl Responder {
    log::info!("[WEBHOOK] Legacy webhook received");

    let response = match ingest_routed(&state, &body, LEGACY_RECEIVED_AT_FIELD) {
        Ok(recorded) => {
            log::info!("[WEBHOOK] Processed: {}", recorded);
            LegacyWebhookResponse {
                status: "sucesso",
                mensagem: "Webhook recebido com sucesso".to_string(),
                total_recebidos: Some(state.webhook_log.len()),
            }
        }
        Err(e) => {
            log::error!("[WEBHOOK] Failed to process legacy webhook: {}", e);
            LegacyWebhookResponse {
                status: "erro",
                mensagem: e.to_string(),
                total_recebidos: None,
            }
        }
    };
    HttpResponse::Ok().json(response)
}

/// Tag, stamp and log the payload, then record it as `kind`
fn ingest_typed(state: &AppState, body: &[u8], kind: EventKind) -> Result<Recorded, IngestError> {
    let mut payload = webhook::parse_body(body)?;
    webhook::tag_payload(&mut payload, kind);
    remember(state, &mut payload, RECEIVED_AT_FIELD);

    log::debug!(
        "[WEBHOOK] {} from {} ({})",
        kind,
        payload.get("number").unwrap_or(&Value::Null),
        payload.get("name").and_then(Value::as_str).unwrap_or("-")
    );

    let event = match kind {
        EventKind::Messages => WebhookEvent::Message(MessageEvent::from_payload(payload)?),
        EventKind::Crm => WebhookEvent::Crm(CrmEvent::from_payload(payload)?),
    };
    Ok(ingest::record(&state.db, &event)?)
}

/// Stamp and log the payload, then record it only if its routing key and
/// event details identify it
fn ingest_routed(state: &AppState, body: &[u8], received_at_field: &str) -> Result<Recorded, IngestError> {
    let mut payload = webhook::parse_body(body)?;
    remember(state, &mut payload, received_at_field);

    let event = WebhookEvent::classify(payload)?;
    match event.kind() {
        Some(kind) => log::debug!("[WEBHOOK] Routed as {}", kind),
        None => log::debug!("[WEBHOOK] No recognized event kind, not persisting"),
    }
    Ok(ingest::record(&state.db, &event)?)
}

fn remember(state: &AppState, payload: &mut Value, received_at_field: &str) {
    webhook::stamp(payload, received_at_field, Utc::now());
    state.webhook_log.push(payload.clone());
}
