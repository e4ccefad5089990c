use actix_web::{web, HttpResponse, Responder};

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const STATUS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>CRM Jason Webhook System</title>
  <style>
    body { font-family: Arial, sans-serif; max-width: 800px; margin: 50px auto; padding: 20px; background: #f5f5f5; }
    .container { background: white; padding: 30px; border-radius: 10px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
    h1 { color: #4285f4; }
    .endpoint { background: #f8f9fa; padding: 15px; margin: 10px 0; border-radius: 5px; border-left: 4px solid #4285f4; }
    code { background: #e8eaed; padding: 2px 6px; border-radius: 3px; font-family: monospace; }
    .success { color: #0f9d58; }
  </style>
</head>
<body>
  <div class="container">
    <h1>CRM Jason Webhook System</h1>
    <p class="success">Sistema online e funcionando!</p>
    <h2>Endpoints:</h2>
    <div class="endpoint"><strong>Mensagens:</strong><br><code>POST /webhook/mensagens</code></div>
    <div class="endpoint"><strong>CRM:</strong><br><code>POST /webhook/crm</code></div>
    <div class="endpoint"><strong>Generico:</strong><br><code>POST /webhook/waspeed</code></div>
    <div class="endpoint"><strong>Listar dados:</strong><br><code>GET /webhooks</code></div>
    <div class="endpoint"><strong>Dashboard:</strong><br><code>GET /api/dashboard/resumo</code> <code>GET /api/dashboard/metricas-30dias</code> <code>GET /api/dashboard/top-contatos?limite=50</code></div>
  </div>
</body>
</html>
"#;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(status_page)));
    cfg.service(web::resource("/webhook/test").route(web::get().to(webhook_test)));
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
}

async fn status_page() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(STATUS_PAGE)
}

async fn webhook_test() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "online",
        "message": "Servidor de webhooks funcionando!",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "endpoints": {
            "mensagens": "/webhook/mensagens",
            "crm": "/webhook/crm",
            "generico": "/webhook/waspeed",
            "listar": "/webhooks"
        }
    }))
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "version": VERSION,
        "store": if state.db.is_connected() { "connected" } else { "unavailable" },
        "webhook_log": {
            "entries": state.webhook_log.len(),
            "capacity": state.webhook_log.capacity()
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controllers::test_support::{disconnected_state, json_body, test_state};
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_status_page_is_html() {
        let app = test::init_service(App::new().app_data(test_state()).configure(config)).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;

        assert_eq!(resp.status(), 200);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("text/html"));

        let body = test::read_body(resp).await;
        assert!(String::from_utf8_lossy(&body).contains("POST /webhook/mensagens"));
    }

    #[actix_web::test]
    async fn test_webhook_test_endpoint() {
        let app = test::init_service(App::new().app_data(test_state()).configure(config)).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/webhook/test").to_request()).await;
        let body = json_body(resp).await;

        assert_eq!(body["status"], "online");
        assert_eq!(body["endpoints"]["generico"], "/webhook/waspeed");
        assert!(body["timestamp"].is_string());
    }

    #[actix_web::test]
    async fn test_health_reports_store_state() {
        let app = test::init_service(App::new().app_data(test_state()).configure(config)).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
        let body = json_body(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], VERSION);
        assert_eq!(body["store"], "connected");

        let app = test::init_service(App::new().app_data(disconnected_state()).configure(config)).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
        assert_eq!(json_body(resp).await["store"], "unavailable");
    }
}
