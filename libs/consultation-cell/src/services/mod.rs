pub mod authorization;
pub mod lifecycle;
pub mod window;

pub use authorization::ConsultationAccessGate;
pub use lifecycle::ConsultationLifecycleService;
pub use window::{check_join_window, WindowCheck};
