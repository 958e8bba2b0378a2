use thiserror::Error;

use antiphase_core::models::error::BackendError;

/// Failures of the WASAPI hardware path.
#[derive(Debug, Error)]
pub enum WasapiError {
    #[error("WASAPI is only available on Windows")]
    UnsupportedPlatform,

    #[error("COM call failed: {0}")]
    Com(String),

    #[error("audio driver not found: {0}")]
    DriverNotFound(String),

    #[error("unsupported stream format: {0}")]
    UnsupportedFormat(String),

    #[error("microphone access is disabled in Windows privacy settings")]
    PermissionDenied,

    #[error("duplex stream did not start within {0} ms")]
    StartupTimeout(u64),

    #[error("duplex stream failed: {0}")]
    Stream(String),
}

impl From<WasapiError> for BackendError {
    fn from(e: WasapiError) -> Self {
        match e {
            WasapiError::UnsupportedPlatform => BackendError::Unavailable(e.to_string()),
            WasapiError::DriverNotFound(name) => BackendError::UnknownDriver(name),
            WasapiError::StartupTimeout(_) => BackendError::Timeout,
            other => BackendError::Driver(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_onto_backend_errors() {
        assert!(matches!(
            BackendError::from(WasapiError::UnsupportedPlatform),
            BackendError::Unavailable(_)
        ));
        assert_eq!(
            BackendError::from(WasapiError::DriverNotFound("Focusrite".into())),
            BackendError::UnknownDriver("Focusrite".into())
        );
        assert_eq!(BackendError::from(WasapiError::StartupTimeout(2000)), BackendError::Timeout);
        assert_eq!(
            BackendError::from(WasapiError::PermissionDenied),
            BackendError::Driver("microphone access is disabled in Windows privacy settings".into())
        );
    }
}
