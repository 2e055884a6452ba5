pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

// Re-export the types most callers need
pub use models::{
    Appointment, AppointmentStatus, Consultation, ConsultationError, ConsultationStatus,
    ConsultationType, JoinOutcome, SessionView, UpdateNotesRequest,
};
pub use services::lifecycle::ConsultationLifecycleService;
