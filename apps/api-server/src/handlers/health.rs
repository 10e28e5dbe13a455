//! Health check endpoint.

use actix_web::{HttpResponse, web};
use learnshare_core::ports::TtlStore;
use serde::Serialize;

use crate::state::AppState;

const PROBE_KEY: &str = "health:probe";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// Health check endpoint - returns server and store status.
///
/// GET /api/health
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let store = match state.store.exists(PROBE_KEY).await {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Store health probe failed");
            "unreachable"
        }
    };

    let response = HealthResponse {
        status: if store == "ok" { "ok" } else { "degraded" },
        store,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    if store == "ok" {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
