// libs/consultation-cell/src/models.rs
use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::auth::UserRole;

/// Hard cap on free-text consultation notes.
pub const MAX_NOTES_LEN: usize = 10_000;

// ==============================================================================
// CORE CONSULTATION MODELS
// ==============================================================================

/// A scheduled booking between one doctor and one patient, created by the
/// booking flow. This cell only ever stamps `video_call_id`,
/// `consultation_id` and `last_updated` onto it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub appointment_date: DateTime<Utc>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub is_immediate: bool,
    #[serde(default)]
    pub consultation_type: ConsultationType,
    pub video_call_id: Option<String>,
    pub consultation_id: Option<Uuid>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// The live/historical session record created when a party actually joins an
/// appointment's meeting. Exactly one exists per appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub scheduled_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: ConsultationStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub consultation_type: ConsultationType,
    pub video_call_id: Option<String>,
    #[serde(default)]
    pub is_immediate: bool,
    /// The two party ids, normalized to strings for comparison stability.
    pub authorized_users: Vec<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationStatus {
    Active,
    Completed,
}

impl fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsultationStatus::Active => write!(f, "active"),
            ConsultationStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationType {
    #[default]
    Video,
    Audio,
    Chat,
}

impl fmt::Display for ConsultationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsultationType::Video => write!(f, "video"),
            ConsultationType::Audio => write!(f, "audio"),
            ConsultationType::Chat => write!(f, "chat"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Session metadata handed to a joining party; the media transport consults
/// `video_call_id` to locate the call room. `start_time`/`scheduled_time`
/// are only present when resuming an existing consultation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub consultation_id: Uuid,
    pub video_call_id: String,
    pub consultation_type: ConsultationType,
    pub is_immediate: bool,
    pub patient_id: String,
    pub doctor_id: String,
    pub user_role: UserRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<DateTime<Utc>>,
}

/// Whether a join request created the consultation (201) or resumed an
/// existing one (200).
#[derive(Debug, Clone)]
pub enum JoinOutcome {
    Created(SessionView),
    Resumed(SessionView),
}

impl JoinOutcome {
    pub fn view(&self) -> &SessionView {
        match self {
            JoinOutcome::Created(view) | JoinOutcome::Resumed(view) => view,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateNotesRequest {
    #[serde(default)]
    pub notes: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConsultationError {
    #[error("Consultation not found")]
    NotFound,

    #[error("Access denied")]
    Forbidden,

    #[error("Consultation not ready: appointment status is {status}")]
    NotReady { status: AppointmentStatus },

    #[error("Outside consultation window")]
    OutsideWindow {
        scheduled_time: DateTime<Utc>,
        current_time: DateTime<Utc>,
        minutes_until_window: Option<f64>,
    },

    #[error("Consultation not active: status is {status}")]
    NotActive {
        status: ConsultationStatus,
        end_time: Option<DateTime<Utc>>,
    },

    #[error("Consultation not found or unauthorized")]
    NotFoundOrUnauthorized,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<StoreError> for ConsultationError {
    fn from(e: StoreError) -> Self {
        ConsultationError::Database(e.to_string())
    }
}

impl IntoResponse for ConsultationError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ConsultationError::NotFound => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "Consultation not found",
                    "details": "No active consultation found with this ID"
                }),
            ),
            ConsultationError::Forbidden => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "Access denied",
                    "details": "You are not authorized to access this consultation"
                }),
            ),
            ConsultationError::NotReady { status } => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "Consultation not ready",
                    "details": "The appointment must be confirmed before joining the consultation",
                    "status": status
                }),
            ),
            ConsultationError::OutsideWindow {
                scheduled_time,
                current_time,
                minutes_until_window,
            } => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "Outside consultation window",
                    "details": "You can join the consultation 15 minutes before or up to 30 minutes after the scheduled time",
                    "scheduled_time": scheduled_time,
                    "current_time": current_time,
                    "minutes_until_window": minutes_until_window
                }),
            ),
            ConsultationError::NotActive { status, end_time } => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "Consultation not active",
                    "details": format!("Consultation status is {}", status),
                    "consultation_data": {
                        "status": status,
                        "end_time": end_time
                    }
                }),
            ),
            ConsultationError::NotFoundOrUnauthorized => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "Consultation not found or unauthorized"
                }),
            ),
            ConsultationError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Validation error",
                    "details": msg
                }),
            ),
            ConsultationError::Database(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Server error",
                    "details": msg
                }),
            ),
        };

        if status.is_server_error() {
            tracing::error!("Consultation error: {}", self);
        } else {
            tracing::warn!("Consultation request rejected: {}", self);
        }

        (status, Json(body)).into_response()
    }
}
