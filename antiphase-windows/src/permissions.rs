//! Windows microphone privacy check.
//!
//! Microphone access for desktop apps is governed by the global toggle at
//! Settings > Privacy > Microphone. There is no per-app consent dialog for
//! unpackaged apps, so the check simply tries to activate the endpoint.

use windows::Win32::Foundation::E_ACCESSDENIED;
use windows::Win32::Media::Audio::*;
use windows::Win32::System::Com::*;

use crate::device_enumerator::{ComGuard, DeviceEnumerator};
use crate::error::WasapiError;

/// Whether the capture endpoint `capture_id` may be opened.
///
/// An id that no longer names an endpoint is `DriverNotFound`, not a denial.
/// Access denied or device-in-use means the privacy toggle is off or the
/// device is held exclusively by another application.
pub fn check_microphone_permission(capture_id: &str) -> Result<bool, WasapiError> {
    let _com = ComGuard::enter()?;
    let enumerator = DeviceEnumerator::new()?;
    let device = enumerator.device(capture_id)?;

    let result: windows::core::Result<IAudioClient> = unsafe { device.Activate(CLSCTX_ALL, None) };
    match result {
        Ok(_) => Ok(true),
        Err(e) if e.code() == E_ACCESSDENIED || e.code() == AUDCLNT_E_DEVICE_IN_USE => Ok(false),
        Err(e) => {
            log::warn!("Unexpected error checking microphone permission: {}", e);
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_capture_id_is_not_a_denial() {
        let result = check_microphone_permission("{0.0.1.00000000}.{no-such-endpoint}");

        assert!(matches!(result, Err(WasapiError::DriverNotFound(id)) if id.contains("no-such-endpoint")));
    }
}
