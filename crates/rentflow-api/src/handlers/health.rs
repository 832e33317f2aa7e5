//! Health check handler

use actix_web::{web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;
use tracing::warn;

/// Service health check
///
/// GET /api/v1/health
///
/// Reports degraded (503) when the database does not answer.
pub async fn health(pool: web::Data<PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "service": "rentflow",
            "version": env!("CARGO_PKG_VERSION"),
        })),
        Err(e) => {
            warn!("Health check database probe failed: {}", e);
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "degraded",
                "service": "rentflow",
                "detail": "database unreachable",
            }))
        }
    }
}

/// Configure health route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
