// =====================================================================================
// SECURITY CELL MODELS
// =====================================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEvent {
    UnauthorizedConsultationAccess,
}

/// One row in the append-only `security_logs` collection. Principal ids are
/// stored as strings so entries compare stably across id representations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityLogEntry {
    pub event: SecurityEvent,
    pub user_id: String,
    pub user_role: String,
    pub consultation_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl SecurityLogEntry {
    pub fn unauthorized_consultation_access(
        user_id: &str,
        user_role: &str,
        consultation_id: Uuid,
    ) -> Self {
        Self {
            event: SecurityEvent::UnauthorizedConsultationAccess,
            user_id: user_id.to_string(),
            user_role: user_role.to_string(),
            consultation_id,
            timestamp: Utc::now(),
        }
    }
}
