use antiphase_core::models::error::SessionError;
use antiphase_core::models::state::SessionStatus;
use antiphase_core::traits::session_observer::SessionObserver;

/// SessionObserver that reports lifecycle events through the log.
pub struct LogObserver;

impl SessionObserver for LogObserver {
    fn on_state_changed(&self, status: &SessionStatus) {
        log::info!(
            "Session {} on {} backend (driver: {})",
            status.state,
            status.backend_kind,
            status.selected_driver_name.as_deref().unwrap_or("none")
        );
    }

    fn on_error(&self, error: &SessionError) {
        log::warn!("Session error: {}", error);
    }
}
