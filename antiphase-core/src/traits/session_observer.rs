use crate::models::error::SessionError;
use crate::models::state::SessionStatus;

/// Observer for session lifecycle notifications.
///
/// Called on the thread that issued the operation, after the engine lock
/// has been released. Implementations should return quickly.
pub trait SessionObserver: Send + Sync {
    /// Called after a lifecycle operation changed the session.
    fn on_state_changed(&self, status: &SessionStatus);

    /// Called when a lifecycle operation failed.
    fn on_error(&self, error: &SessionError);
}
