use std::fmt;

use serde::Serialize;

use super::endpoint::{DriverInfo, EndpointId};
use super::gain::Gain;

/// Session lifecycle state.
///
/// ```text
/// Uninitialized → Initialized ⇄ Processing
///        ↑             ↓ (re-initialize failed)
///        └──────── Faulted ──→ Initialized (initialize succeeded)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Uninitialized,
    Initialized,
    Processing,
    Faulted,
}

impl SessionState {
    pub fn is_processing(self) -> bool {
        matches!(self, Self::Processing)
    }

    pub fn is_initialized(self) -> bool {
        matches!(self, Self::Initialized)
    }

    /// A driver may be (re)opened from any state except while audio is running.
    pub fn can_initialize(self) -> bool {
        !self.is_processing()
    }

    /// State after a failed `initialize`.
    ///
    /// A fresh session may simply retry; an opened driver binding can no
    /// longer be trusted once re-initialization failed.
    pub fn after_failed_initialize(self) -> Self {
        match self {
            Self::Initialized | Self::Faulted => Self::Faulted,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Processing => "processing",
            Self::Faulted => "faulted",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which provider served a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Hardware,
    Simulated,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hardware => f.write_str("hardware"),
            Self::Simulated => f.write_str("simulated"),
        }
    }
}

/// Point-in-time view of the session, as returned by `status()`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub state: SessionState,
    pub backend_kind: BackendKind,
    pub selected_driver_name: Option<String>,
    pub input_endpoint_id: Option<EndpointId>,
    pub output_endpoint_id: Option<EndpointId>,
    pub gain: Gain,
    pub hardware_available: bool,
    pub driver_info: Option<DriverInfo>,
    pub last_error: Option<String>,
}

/// How a successful `stop` was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing was running; the backend was not contacted.
    AlreadyStopped,
    /// The backend stopped the audio path.
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_initialize_faults_only_an_opened_session() {
        assert_eq!(
            SessionState::Uninitialized.after_failed_initialize(),
            SessionState::Uninitialized
        );
        assert_eq!(SessionState::Initialized.after_failed_initialize(), SessionState::Faulted);
        assert_eq!(SessionState::Faulted.after_failed_initialize(), SessionState::Faulted);
    }

    #[test]
    fn only_processing_blocks_initialize() {
        assert!(SessionState::Faulted.can_initialize());
        assert!(SessionState::Initialized.can_initialize());
        assert!(!SessionState::Processing.can_initialize());
    }

    #[test]
    fn state_serializes_camel_case() {
        assert_eq!(serde_json::to_value(SessionState::Processing).unwrap(), "processing");
        assert_eq!(serde_json::to_value(BackendKind::Simulated).unwrap(), "simulated");
    }
}
