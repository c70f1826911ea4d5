use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

/// Liveness and database reachability.
///
/// Responses:
/// - 200 OK: `{"status": "ok", "database": "up", "timestamp": ...}`
/// - 503 Service Unavailable: the store did not answer
#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "database": "up",
            "timestamp": Utc::now()
        })),
        Err(e) => {
            log::error!("Health check could not reach the store: {}", e);
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "degraded",
                "database": "down",
                "timestamp": Utc::now()
            }))
        }
    }
}
