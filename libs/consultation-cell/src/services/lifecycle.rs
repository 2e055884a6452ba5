// libs/consultation-cell/src/services/lifecycle.rs
//
// Appointment-to-consultation lifecycle management: turns a confirmed
// appointment into an active, access-controlled consultation session,
// enforces the join window, keeps session creation idempotent under
// concurrent joins, and tracks completion.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use security_cell::AuditService;
use shared_database::store::Filter;
use shared_database::{DocumentStore, InsertOutcome};
use shared_models::auth::{User, UserRole};

use crate::models::{
    Appointment, AppointmentStatus, Consultation, ConsultationError, ConsultationStatus,
    JoinOutcome, SessionView, MAX_NOTES_LEN,
};
use crate::services::authorization::ConsultationAccessGate;
use crate::services::window::{check_join_window, WindowCheck};

const APPOINTMENTS: &str = "appointments";
const CONSULTATIONS: &str = "consultations";

/// Stable call-room id, derived from the record that introduced it so every
/// joiner resolves the same room.
pub fn derive_video_call_id(id: Uuid) -> String {
    format!("call_{}", id)
}

pub struct ConsultationLifecycleService {
    store: Arc<dyn DocumentStore>,
    access_gate: ConsultationAccessGate,
    audit: AuditService,
}

impl ConsultationLifecycleService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            access_gate: ConsultationAccessGate::new(),
            audit: AuditService::new(store.clone()),
            store,
        }
    }

    /// Resolve a join request. The id may name an existing consultation
    /// (resume) or an appointment that has not produced one yet (create).
    pub async fn join_or_create(
        &self,
        session_id: Uuid,
        user: &User,
    ) -> Result<JoinOutcome, ConsultationError> {
        if let Some(consultation) = self
            .find_consultation(&[("id", session_id.to_string())])
            .await?
        {
            return self.resume(consultation, user).await;
        }

        debug!("No consultation {}, trying appointment lookup", session_id);

        let appointment = self
            .find_appointment(session_id)
            .await?
            .ok_or(ConsultationError::NotFound)?;

        self.create_from_appointment(appointment, user).await
    }

    /// Create path: validate readiness, party and join window, then insert
    /// the consultation exactly once per appointment.
    async fn create_from_appointment(
        &self,
        appointment: Appointment,
        user: &User,
    ) -> Result<JoinOutcome, ConsultationError> {
        if appointment.status != AppointmentStatus::Confirmed {
            return Err(ConsultationError::NotReady {
                status: appointment.status,
            });
        }

        let is_bound_party = match user.role {
            UserRole::Doctor => appointment.doctor_id.to_string() == user.id,
            UserRole::Patient => appointment.patient_id.to_string() == user.id,
            _ => false,
        };
        if !is_bound_party {
            return Err(ConsultationError::Forbidden);
        }

        let now = Utc::now();
        if let WindowCheck::Outside {
            minutes_until_open, ..
        } = check_join_window(appointment.appointment_date, now, appointment.is_immediate)
        {
            return Err(ConsultationError::OutsideWindow {
                scheduled_time: appointment.appointment_date,
                current_time: now,
                minutes_until_window: minutes_until_open,
            });
        }

        let video_call_id = self.ensure_appointment_video_call_id(&appointment).await?;

        let consultation = Consultation {
            id: Uuid::new_v4(),
            appointment_id: appointment.id,
            patient_id: appointment.patient_id,
            doctor_id: appointment.doctor_id,
            patient_name: appointment.patient_name.clone(),
            doctor_name: appointment.doctor_name.clone(),
            scheduled_time: appointment.appointment_date,
            start_time: now,
            end_time: None,
            status: ConsultationStatus::Active,
            notes: String::new(),
            consultation_type: appointment.consultation_type,
            video_call_id: Some(video_call_id.clone()),
            is_immediate: appointment.is_immediate,
            authorized_users: ConsultationAccessGate::authorized_parties(
                &appointment.doctor_id,
                &appointment.patient_id,
            ),
            completed_at: None,
        };

        let document = serde_json::to_value(&consultation)
            .map_err(|e| ConsultationError::Database(e.to_string()))?;

        // The store enforces a uniqueness constraint on appointment_id, so
        // concurrent joins produce exactly one consultation; the losing
        // writer re-reads and resumes the winner's session.
        match self.store.insert_unique(CONSULTATIONS, document).await? {
            InsertOutcome::Inserted(_) => {}
            InsertOutcome::Conflict => {
                let existing = self
                    .find_consultation(&[("appointment_id", appointment.id.to_string())])
                    .await?
                    .ok_or(ConsultationError::NotFound)?;
                return self.resume(existing, user).await;
            }
        }

        self.store
            .update_one(
                APPOINTMENTS,
                &[("id", appointment.id.to_string())],
                json!({
                    "consultation_id": consultation.id,
                    "last_updated": now
                }),
            )
            .await?;

        info!(
            "Created consultation {} for appointment {} with video_call_id {}",
            consultation.id, appointment.id, video_call_id
        );

        Ok(JoinOutcome::Created(SessionView {
            consultation_id: consultation.id,
            video_call_id,
            consultation_type: consultation.consultation_type,
            is_immediate: consultation.is_immediate,
            patient_id: appointment.patient_id.to_string(),
            doctor_id: appointment.doctor_id.to_string(),
            user_role: user.role,
            start_time: None,
            scheduled_time: None,
        }))
    }

    /// Resume path: gate on the authorized parties, require an active
    /// session and hand back the same call-room id every time.
    async fn resume(
        &self,
        consultation: Consultation,
        user: &User,
    ) -> Result<JoinOutcome, ConsultationError> {
        if !self
            .access_gate
            .is_authorized_party(&consultation.authorized_users, &user.id)
        {
            self.audit
                .record_unauthorized_consultation_access(user, consultation.id)
                .await;
            return Err(ConsultationError::Forbidden);
        }

        if consultation.status != ConsultationStatus::Active {
            return Err(ConsultationError::NotActive {
                status: consultation.status,
                end_time: consultation.end_time,
            });
        }

        let video_call_id = match consultation.video_call_id.clone() {
            Some(video_call_id) => video_call_id,
            None => {
                // Rows written before call ids were stable; backfill is
                // deterministic, so racing writers agree on the value.
                let video_call_id = derive_video_call_id(consultation.id);
                self.store
                    .update_one(
                        CONSULTATIONS,
                        &[("id", consultation.id.to_string())],
                        json!({ "video_call_id": video_call_id.clone() }),
                    )
                    .await?;
                video_call_id
            }
        };

        info!(
            "User {} ({}) joined consultation {}",
            user.id, user.role, consultation.id
        );

        Ok(JoinOutcome::Resumed(SessionView {
            consultation_id: consultation.id,
            video_call_id,
            consultation_type: consultation.consultation_type,
            is_immediate: consultation.is_immediate,
            patient_id: consultation.patient_id.to_string(),
            doctor_id: consultation.doctor_id.to_string(),
            user_role: user.role,
            start_time: Some(consultation.start_time),
            scheduled_time: Some(consultation.scheduled_time),
        }))
    }

    /// Mark a consultation completed. Only the owning doctor may do so; the
    /// compound filter makes "does not exist" and "not yours"
    /// indistinguishable to the caller.
    pub async fn complete(
        &self,
        consultation_id: Uuid,
        user: &User,
    ) -> Result<(), ConsultationError> {
        if user.role != UserRole::Doctor {
            return Err(ConsultationError::Forbidden);
        }

        let matched = self
            .store
            .update_one(
                CONSULTATIONS,
                &[
                    ("id", consultation_id.to_string()),
                    ("doctor_id", user.id.clone()),
                ],
                json!({
                    "status": ConsultationStatus::Completed,
                    "completed_at": Utc::now()
                }),
            )
            .await?;

        if matched == 0 {
            return Err(ConsultationError::NotFoundOrUnauthorized);
        }

        info!("Doctor {} completed consultation {}", user.id, consultation_id);
        Ok(())
    }

    /// Overwrite the consultation notes. Either bound party may write;
    /// denials here are not audited.
    pub async fn update_notes(
        &self,
        consultation_id: Uuid,
        user: &User,
        notes: String,
    ) -> Result<(), ConsultationError> {
        let consultation = self
            .find_consultation(&[("id", consultation_id.to_string())])
            .await?
            .ok_or(ConsultationError::NotFound)?;

        if !self
            .access_gate
            .is_authorized_party(&consultation.authorized_users, &user.id)
        {
            return Err(ConsultationError::Forbidden);
        }

        if notes.chars().count() > MAX_NOTES_LEN {
            return Err(ConsultationError::Validation(format!(
                "Notes exceed the maximum length of {} characters",
                MAX_NOTES_LEN
            )));
        }

        self.store
            .update_one(
                CONSULTATIONS,
                &[("id", consultation_id.to_string())],
                json!({ "notes": notes }),
            )
            .await?;

        Ok(())
    }

    /// Fetch a consultation document for one of its parties or an admin.
    pub async fn get_consultation(
        &self,
        consultation_id: Uuid,
        user: &User,
    ) -> Result<Consultation, ConsultationError> {
        let consultation = self
            .find_consultation(&[("id", consultation_id.to_string())])
            .await?
            .ok_or(ConsultationError::NotFound)?;

        let is_party = self
            .access_gate
            .is_authorized_party(&consultation.authorized_users, &user.id);
        if !is_party && !user.is_admin() {
            return Err(ConsultationError::Forbidden);
        }

        Ok(consultation)
    }

    async fn find_consultation(
        &self,
        filter: Filter<'_>,
    ) -> Result<Option<Consultation>, ConsultationError> {
        let Some(document) = self.store.find_one(CONSULTATIONS, filter).await? else {
            return Ok(None);
        };

        let consultation = serde_json::from_value(document)
            .map_err(|e| ConsultationError::Database(format!("Failed to parse consultation: {}", e)))?;
        Ok(Some(consultation))
    }

    async fn find_appointment(&self, id: Uuid) -> Result<Option<Appointment>, ConsultationError> {
        let Some(document) = self
            .store
            .find_one(APPOINTMENTS, &[("id", id.to_string())])
            .await?
        else {
            return Ok(None);
        };

        let appointment = serde_json::from_value(document)
            .map_err(|e| ConsultationError::Database(format!("Failed to parse appointment: {}", e)))?;
        Ok(Some(appointment))
    }

    /// Reuse the appointment's call id if present, otherwise derive it from
    /// the appointment id and persist it (idempotent set).
    async fn ensure_appointment_video_call_id(
        &self,
        appointment: &Appointment,
    ) -> Result<String, ConsultationError> {
        if let Some(video_call_id) = appointment.video_call_id.clone() {
            return Ok(video_call_id);
        }

        let video_call_id = derive_video_call_id(appointment.id);
        self.store
            .update_one(
                APPOINTMENTS,
                &[("id", appointment.id.to_string())],
                json!({ "video_call_id": video_call_id.clone() }),
            )
            .await?;

        Ok(video_call_id)
    }
}
