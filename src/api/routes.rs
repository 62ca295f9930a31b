//! API Routes
//!
//! Configures the Axum router for the frontend API.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    batch_handler, delete_handler, get_handler, health_handler, stats_handler, AppState,
};

/// Creates the frontend router.
///
/// # Endpoints
/// - `GET /api?key=K` - Value bytes for a key
/// - `GET /api/stats` - Group statistics
/// - `GET /api/healthz` - Health check with statistics
/// - `GET /api/batch?keys=a,b` - Several keys at once
/// - `DELETE /api/delete?key=K` - Evict a key locally
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api", get(get_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/healthz", get(health_handler))
        .route("/api/batch", get(batch_handler))
        .route("/api/delete", delete(delete_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
