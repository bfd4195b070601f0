//! API route handlers - maps HTTP endpoints to explorer operations.
//!
//! Each submodule defines routes for a feature area:
//! - `storage`: Listing, download and tree endpoints (GET /api/v1/storage/*)
//! - `health`: Liveness check (GET /api/v1/health)

pub mod health;
pub mod storage;

use axum::Router;

use crate::storage::SharedExplorer;

pub fn create_router(explorer: SharedExplorer) -> Router {
    Router::new()
        .merge(storage::routes(explorer.clone()))
        .merge(health::routes(explorer))
}
