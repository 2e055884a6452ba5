// libs/consultation-cell/src/services/window.rs
use chrono::{DateTime, Utc};

/// How early a party may join, in minutes before the scheduled time.
pub const EARLY_JOIN_MINUTES: f64 = 15.0;
/// How late a party may still join, in minutes after the scheduled time.
pub const LATE_JOIN_MINUTES: f64 = 30.0;

#[derive(Debug, Clone, PartialEq)]
pub enum WindowCheck {
    Allowed,
    Outside {
        /// Fractional minutes from `now` to the scheduled time; positive
        /// while the appointment is still ahead.
        minutes_to_scheduled: f64,
        /// Minutes until the join window opens. Only set when the window has
        /// not opened yet; a too-late join has no upcoming window to report.
        minutes_until_open: Option<f64>,
    },
}

/// Join-window policy: a session is joinable within [-30, +15] minutes of
/// its scheduled time. Immediate appointments have no fixed schedule and are
/// joinable at any time once confirmed.
pub fn check_join_window(
    scheduled_time: DateTime<Utc>,
    now: DateTime<Utc>,
    is_immediate: bool,
) -> WindowCheck {
    if is_immediate {
        return WindowCheck::Allowed;
    }

    let minutes_to_scheduled = (scheduled_time - now).num_seconds() as f64 / 60.0;

    if minutes_to_scheduled > EARLY_JOIN_MINUTES {
        WindowCheck::Outside {
            minutes_to_scheduled,
            minutes_until_open: Some(minutes_to_scheduled - EARLY_JOIN_MINUTES),
        }
    } else if minutes_to_scheduled < -LATE_JOIN_MINUTES {
        WindowCheck::Outside {
            minutes_to_scheduled,
            minutes_until_open: None,
        }
    } else {
        WindowCheck::Allowed
    }
}
