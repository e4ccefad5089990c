pub mod dashboard;
pub mod health;
pub mod webhooks;

#[cfg(test)]
pub(crate) mod test_support {
    use actix_web::body::MessageBody;
    use actix_web::dev::ServiceResponse;
    use actix_web::{test, web};
    use serde_json::Value;
    use std::sync::Arc;

    use crate::db::Database;
    use crate::webhook_log::WebhookLog;
    use crate::AppState;

    pub fn test_state() -> web::Data<AppState> {
        let db = Database::new(":memory:").expect("in-memory database");
        state_with(db)
    }

    pub fn disconnected_state() -> web::Data<AppState> {
        state_with(Database::disconnected("test store unavailable"))
    }

    fn state_with(db: Database) -> web::Data<AppState> {
        web::Data::new(AppState {
            db: Arc::new(db),
            webhook_log: Arc::new(WebhookLog::new(100)),
        })
    }

    pub async fn json_body<B: MessageBody>(resp: ServiceResponse<B>) -> Value {
        test::read_body_json(resp).await
    }
}
