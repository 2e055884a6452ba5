use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;

use consultation_cell::router::consultation_routes;
use consultation_cell::services::lifecycle::ConsultationLifecycleService;
use shared_config::AppConfig;
use shared_models::error::AppError;

pub fn create_router(
    config: Arc<AppConfig>,
    lifecycle: Arc<ConsultationLifecycleService>,
) -> Router {
    let health_config = config.clone();

    Router::new()
        .route(
            "/",
            get(|| async { "Telemedicine consultation API is running!" }),
        )
        .route(
            "/health",
            get(move || {
                let config = health_config.clone();
                async move {
                    Json(json!({
                        "status": "healthy",
                        "store": if config.is_configured() {
                            "configured"
                        } else {
                            "not configured"
                        }
                    }))
                }
            }),
        )
        .nest("/consultations", consultation_routes(config, lifecycle))
        .fallback(|| async { AppError::NotFound("Resource not found".to_string()) })
}
