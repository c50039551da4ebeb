use actix_web::{HttpResponse, Responder, get, web};
use serde::Serialize;
use tracing::error;

use crate::db::EntityStore;

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    database: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint
///
/// General health check including database connectivity.
/// Use for load balancers and uptime monitors.
#[get("/health")]
async fn health_check(store: web::Data<dyn EntityStore>) -> impl Responder {
    match store.ping().await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse {
            status: "healthy".to_string(),
            database: "connected".to_string(),
            error: None,
        }),
        Err(e) => {
            error!("Health check failed: {:?}", e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "unhealthy".to_string(),
                database: "disconnected".to_string(),
                error: Some(format!("Database error: {}", e)),
            })
        }
    }
}

/// Readiness check endpoint
///
/// Returns 503 while the database is unavailable; the process recovers
/// once it returns.
#[get("/ready")]
async fn readiness_check(store: web::Data<dyn EntityStore>) -> impl Responder {
    match store.ping().await {
        Ok(()) => HttpResponse::Ok().json(HealthResponse {
            status: "ready".to_string(),
            database: "connected".to_string(),
            error: None,
        }),
        Err(e) => {
            error!("Readiness check failed: database unavailable: {:?}", e);
            HttpResponse::ServiceUnavailable().json(HealthResponse {
                status: "not_ready".to_string(),
                database: "disconnected".to_string(),
                error: Some(format!("Database unavailable: {}", e)),
            })
        }
    }
}

/// Liveness check endpoint, never touches dependencies
#[get("/live")]
async fn liveness_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "alive".to_string(),
        database: "not_checked".to_string(),
        error: None,
    })
}

pub fn health_config(config: &mut web::ServiceConfig) {
    config
        .service(health_check)
        .service(readiness_check)
        .service(liveness_check);
}
