// libs/consultation-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::lifecycle::ConsultationLifecycleService;

pub fn consultation_routes(
    config: Arc<AppConfig>,
    lifecycle: Arc<ConsultationLifecycleService>,
) -> Router {
    // All consultation operations require authentication
    let protected_routes = Router::new()
        .route("/join/{session_id}", get(handlers::join_consultation))
        .route("/{consultation_id}", get(handlers::get_consultation))
        .route(
            "/{consultation_id}/complete",
            put(handlers::complete_consultation),
        )
        .route(
            "/{consultation_id}/notes",
            put(handlers::update_consultation_notes),
        )
        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new().merge(protected_routes).with_state(lifecycle)
}
