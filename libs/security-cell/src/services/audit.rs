// =====================================================================================
// AUDIT SERVICE - SECURITY EVENT LOGGING
// =====================================================================================

use std::sync::Arc;

use tracing::{error, warn};
use uuid::Uuid;

use crate::models::SecurityLogEntry;
use shared_database::DocumentStore;
use shared_models::auth::User;

const SECURITY_LOGS: &str = "security_logs";

pub struct AuditService {
    store: Arc<dyn DocumentStore>,
}

impl AuditService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Append an entry to the security log. Logs to tracing immediately;
    /// persistence is fire-and-forget, so a store failure is reported but
    /// never surfaced to the request that produced the entry.
    pub async fn record(&self, entry: SecurityLogEntry) {
        warn!(
            event = ?entry.event,
            user_id = %entry.user_id,
            user_role = %entry.user_role,
            consultation_id = %entry.consultation_id,
            "AUDIT: {:?}", entry.event
        );

        let document = match serde_json::to_value(&entry) {
            Ok(document) => document,
            Err(e) => {
                error!("Failed to serialize security log entry: {}", e);
                return;
            }
        };

        if let Err(e) = self.store.insert_one(SECURITY_LOGS, document).await {
            error!("Failed to persist security log entry: {}", e);
        }
    }

    pub async fn record_unauthorized_consultation_access(
        &self,
        user: &User,
        consultation_id: Uuid,
    ) {
        let entry = SecurityLogEntry::unauthorized_consultation_access(
            &user.id,
            &user.role.to_string(),
            consultation_id,
        );
        self.record(entry).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::auth::UserRole;
    use shared_utils::test_utils::{MemoryDocumentStore, TestUser};

    #[tokio::test]
    async fn unauthorized_access_is_appended_to_security_logs() {
        let store = Arc::new(MemoryDocumentStore::new());
        let audit = AuditService::new(store.clone());
        let intruder = TestUser::patient("intruder@example.com").to_user();
        let consultation_id = Uuid::new_v4();

        audit
            .record_unauthorized_consultation_access(&intruder, consultation_id)
            .await;

        let logs = store.documents("security_logs");
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["event"], "unauthorized_consultation_access");
        assert_eq!(logs[0]["user_id"], intruder.id);
        assert_eq!(logs[0]["user_role"], UserRole::Patient.to_string());
        assert_eq!(logs[0]["consultation_id"], consultation_id.to_string());
    }
}
