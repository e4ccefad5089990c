use actix_cors::Cors;
use actix_web::{middleware::DefaultHeaders, middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

mod config;
mod controllers;
mod db;
mod error;
mod ingest;
mod models;
mod webhook_log;

use config::Config;
use db::Database;
use webhook_log::WebhookLog;

pub struct AppState {
    pub db: Arc<Database>,
    pub webhook_log: Arc<WebhookLog>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = match Database::new(&config.database_url) {
        Ok(db) => db,
        Err(e) => {
            // Keep serving: webhooks are still acknowledged and kept in memory
            log::error!("Failed to initialize database: {}", e);
            Database::disconnected(e.to_string())
        }
    };
    let db = Arc::new(db);

    log::info!("Keeping up to {} webhooks in memory", config.webhook_log_capacity);
    let webhook_log = Arc::new(WebhookLog::new(config.webhook_log_capacity));

    log::info!("================================");
    log::info!("[OK] Server starting on port {}", port);
    log::info!("[ENDPOINTS]");
    log::info!("  POST /webhook/mensagens");
    log::info!("  POST /webhook/crm");
    log::info!("  POST /webhook/waspeed");
    log::info!("  GET  /webhooks");
    log::info!("  GET  /api/dashboard/resumo");
    log::info!("  GET  /api/dashboard/metricas-30dias");
    log::info!("  GET  /api/dashboard/top-contatos");
    log::info!("================================");

    let max_payload_bytes = config.max_payload_bytes;

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        let security_headers = DefaultHeaders::new()
            .add(("X-Content-Type-Options", "nosniff"))
            .add(("X-Frame-Options", "SAMEORIGIN"))
            .add(("Referrer-Policy", "no-referrer"));

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                webhook_log: Arc::clone(&webhook_log),
            }))
            .app_data(web::PayloadConfig::new(max_payload_bytes))
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(security_headers)
            .configure(controllers::health::config)
            .configure(controllers::webhooks::config)
            .configure(controllers::dashboard::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
