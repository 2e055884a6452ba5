// libs/consultation-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;

use crate::models::{ConsultationError, JoinOutcome, SessionView, UpdateNotesRequest};
use crate::services::lifecycle::ConsultationLifecycleService;

/// Join a consultation session by consultation id, or by appointment id when
/// the session does not exist yet. 201 on creation, 200 on resume.
#[axum::debug_handler]
pub async fn join_consultation(
    State(lifecycle): State<Arc<ConsultationLifecycleService>>,
    Path(session_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<(StatusCode, Json<SessionView>), ConsultationError> {
    match lifecycle.join_or_create(session_id, &user).await? {
        JoinOutcome::Created(view) => Ok((StatusCode::CREATED, Json(view))),
        JoinOutcome::Resumed(view) => Ok((StatusCode::OK, Json(view))),
    }
}

#[axum::debug_handler]
pub async fn get_consultation(
    State(lifecycle): State<Arc<ConsultationLifecycleService>>,
    Path(consultation_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, ConsultationError> {
    let consultation = lifecycle.get_consultation(consultation_id, &user).await?;

    Ok(Json(json!({ "consultation": consultation })))
}

#[axum::debug_handler]
pub async fn complete_consultation(
    State(lifecycle): State<Arc<ConsultationLifecycleService>>,
    Path(consultation_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, ConsultationError> {
    lifecycle.complete(consultation_id, &user).await?;

    Ok(Json(json!({
        "message": "Consultation marked as completed"
    })))
}

#[axum::debug_handler]
pub async fn update_consultation_notes(
    State(lifecycle): State<Arc<ConsultationLifecycleService>>,
    Path(consultation_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateNotesRequest>,
) -> Result<Json<Value>, ConsultationError> {
    lifecycle
        .update_notes(consultation_id, &user, request.notes)
        .await?;

    Ok(Json(json!({
        "message": "Notes updated successfully"
    })))
}
