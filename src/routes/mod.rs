//! Rutas HTTP
//!
//! Un router por recurso, montados bajo `/api` junto con el health check.

pub mod guide_routes;
pub mod incident_routes;

use axum::{response::Json, routing::get, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::middleware::cors_from_config;
use crate::state::AppState;

/// Router completo de la aplicación
pub fn create_app_router(state: AppState) -> Router {
    let cors = cors_from_config(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/guides", guide_routes::create_guide_router())
        .nest("/api/incidents", incident_routes::create_incident_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "delivery-guides",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
