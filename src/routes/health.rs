//! Liveness check.
//!
//! GET /api/v1/health
//!
//! Reports the service as healthy along with the current UTC time and which
//! backend this instance serves. Does not touch the backend.

use axum::{extract::State, routing::get, Json, Router};

use crate::models::HealthResponse;
use crate::storage::SharedExplorer;

pub fn routes(explorer: SharedExplorer) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_check))
        .with_state(explorer)
}

async fn health_check(State(explorer): State<SharedExplorer>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        backend: explorer.backend().name(),
    })
}
