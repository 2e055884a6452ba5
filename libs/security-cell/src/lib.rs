// =====================================================================================
// SECURITY CELL - ACCESS AUDIT TRAIL
// =====================================================================================
//
// Records denied consultation access attempts to the append-only
// `security_logs` collection for security monitoring. Writes are
// fire-and-forget: an unavailable audit store never blocks the request
// that triggered the entry.
//
// =====================================================================================

pub mod models;
pub mod services;

pub use models::{SecurityEvent, SecurityLogEntry};
pub use services::AuditService;
