// libs/consultation-cell/src/services/authorization.rs
use uuid::Uuid;

/// Stateless gate deciding whether a principal is one of the parties bound
/// to a consultation. Ids are compared as normalized strings so the check is
/// stable across id representations.
pub struct ConsultationAccessGate;

impl ConsultationAccessGate {
    pub fn new() -> Self {
        Self
    }

    pub fn is_authorized_party(&self, authorized_users: &[String], principal_id: &str) -> bool {
        authorized_users.iter().any(|user_id| user_id == principal_id)
    }

    /// The authorized set for a new consultation: exactly the two bound
    /// parties, doctor first.
    pub fn authorized_parties(doctor_id: &Uuid, patient_id: &Uuid) -> Vec<String> {
        vec![doctor_id.to_string(), patient_id.to_string()]
    }
}

impl Default for ConsultationAccessGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_bound_parties_are_allowed() {
        let gate = ConsultationAccessGate::new();
        let doctor_id = Uuid::new_v4();
        let patient_id = Uuid::new_v4();
        let parties = ConsultationAccessGate::authorized_parties(&doctor_id, &patient_id);

        assert_eq!(parties.len(), 2);
        assert!(gate.is_authorized_party(&parties, &doctor_id.to_string()));
        assert!(gate.is_authorized_party(&parties, &patient_id.to_string()));
    }

    #[test]
    fn third_parties_are_denied() {
        let gate = ConsultationAccessGate::new();
        let parties = ConsultationAccessGate::authorized_parties(&Uuid::new_v4(), &Uuid::new_v4());

        assert!(!gate.is_authorized_party(&parties, &Uuid::new_v4().to_string()));
        assert!(!gate.is_authorized_party(&parties, ""));
    }

    #[test]
    fn comparison_is_exact_not_prefix() {
        let gate = ConsultationAccessGate::new();
        let doctor_id = Uuid::new_v4();
        let parties = vec![doctor_id.to_string()];

        let truncated = &doctor_id.to_string()[..8];
        assert!(!gate.is_authorized_party(&parties, truncated));
    }
}
