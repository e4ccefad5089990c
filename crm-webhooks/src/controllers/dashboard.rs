//! Dashboard read endpoints
//!
//! Unlike the webhook endpoints these are operator-facing: store errors are
//! reported as HTTP 500.

use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{Database, DEFAULT_TOP_CONTACTS_LIMIT};
use crate::error::{StoreError, StoreResult};
use crate::models::{Contact, StoredCrmEvent, StoredMessage};
use crate::AppState;

/// Row cap for each table in the `/webhooks` listing
const RECENT_LIMIT: usize = 100;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/dashboard")
            .route("/resumo", web::get().to(get_user_summary))
            .route("/metricas-30dias", web::get().to(get_metrics_30_days))
            .route("/top-contatos", web::get().to(get_top_contacts)),
    );
    cfg.service(web::resource("/webhooks").route(web::get().to(list_webhooks)));
}

#[derive(Debug, Deserialize)]
pub struct TopContactsQuery {
    limite: Option<String>,
}

impl TopContactsQuery {
    /// Requested row limit; missing, invalid or non-positive values use the default
    fn limit(&self) -> i64 {
        self.limite
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_TOP_CONTACTS_LIMIT)
    }
}

#[derive(Debug, Serialize)]
struct RecentActivity {
    total: usize,
    mensagens: Vec<StoredMessage>,
    eventos_crm: Vec<StoredCrmEvent>,
    contatos: Vec<Contact>,
    fonte: &'static str,
}

#[derive(Debug, Serialize)]
struct LoggedWebhooks {
    total: usize,
    dados: Vec<Value>,
    fonte: &'static str,
}

async fn get_user_summary(state: web::Data<AppState>) -> impl Responder {
    view_response("resumo", state.db.dashboard_user_summary())
}

async fn get_metrics_30_days(state: web::Data<AppState>) -> impl Responder {
    view_response("metricas-30dias", state.db.dashboard_metrics_30_days())
}

async fn get_top_contacts(state: web::Data<AppState>, query: web::Query<TopContactsQuery>) -> impl Responder {
    view_response("top-contatos", state.db.dashboard_top_contacts(query.limit()))
}

fn view_response(view: &str, rows: StoreResult<Vec<Value>>) -> HttpResponse {
    match rows {
        Ok(dados) => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "dados": dados
        })),
        Err(e) => {
            log::error!("Failed to load dashboard view {}: {}", view, e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": e.to_string()
            }))
        }
    }
}

/// Recent stored messages and CRM events, or the in-memory log if the store
/// cannot be read
async fn list_webhooks(state: web::Data<AppState>) -> impl Responder {
    match load_recent(&state.db) {
        Ok(activity) => HttpResponse::Ok().json(activity),
        Err(e) => {
            log::warn!("Failed to read recent webhooks from store, using in-memory log: {}", e);
            let dados = state.webhook_log.snapshot();
            HttpResponse::Ok().json(LoggedWebhooks {
                total: dados.len(),
                dados,
                fonte: "memoria",
            })
        }
    }
}

fn load_recent(db: &Database) -> Result<RecentActivity, StoreError> {
    let mensagens = db.list_recent_messages(RECENT_LIMIT)?;
    let eventos_crm = db.list_recent_crm_events(RECENT_LIMIT)?;
    let contatos = db.list_recent_contacts(RECENT_LIMIT)?;

    Ok(RecentActivity {
        total: mensagens.len() + eventos_crm.len(),
        mensagens,
        eventos_crm,
        contatos,
        fonte: "banco",
    })
}

#[cfg(test)]
mod query_tests {
    use super::*;

    fn query(limite: Option<&str>) -> TopContactsQuery {
        TopContactsQuery {
            limite: limite.map(str::to_string),
        }
    }

    #[test]
    fn test_top_contacts_limit() {
        assert_eq!(query(None).limit(), 50);
        assert_eq!(query(Some("5")).limit(), 5);
        assert_eq!(query(Some(" 7 ")).limit(), 7);
        assert_eq!(query(Some("0")).limit(), 50);
        assert_eq!(query(Some("-3")).limit(), 50);
        assert_eq!(query(Some("abc")).limit(), 50);
        assert_eq!(query(Some("5; DROP TABLE contacts")).limit(), 50);
    }
}
