//! # antiphase-windows
//!
//! Windows WASAPI hardware backend for antiphase.
//!
//! Provides:
//! - `WasapiBackend`: shared-mode duplex stream (capture → invert → render) on one audio adapter
//! - `DeviceEnumerator`: adapters exposing both capture and render endpoints, via the MMDevice API
//! - `permissions`: Windows microphone privacy check
//! - `probe`: hardware backend factory; reports "unavailable" off Windows
//!
//! ## Usage
//! ```ignore
//! use antiphase_core::{EngineConfig, HardwareConfig, SessionEngine};
//!
//! let engine = SessionEngine::new(EngineConfig::default(), antiphase_windows::probe(HardwareConfig::default()));
//! ```

pub mod error;

#[cfg(target_os = "windows")]
pub mod device_enumerator;
#[cfg(target_os = "windows")]
pub mod permissions;
#[cfg(target_os = "windows")]
pub mod wasapi_duplex;

#[cfg(target_os = "windows")]
pub use device_enumerator::{AdapterDriver, DeviceEnumerator};
#[cfg(target_os = "windows")]
pub use wasapi_duplex::WasapiBackend;

pub use error::WasapiError;

use antiphase_core::models::config::HardwareConfig;
use antiphase_core::models::error::BackendError;
use antiphase_core::traits::backend_provider::BackendProvider;

/// Construct the hardware backend for this platform.
///
/// The result is handed unchanged to `SessionEngine::new`, which decides
/// once whether hardware is used.
pub fn probe(config: HardwareConfig) -> Result<Box<dyn BackendProvider>, BackendError> {
    config
        .validate()
        .map_err(|e| BackendError::Unavailable(e.to_string()))?;
    open_backend(config)
}

#[cfg(target_os = "windows")]
fn open_backend(config: HardwareConfig) -> Result<Box<dyn BackendProvider>, BackendError> {
    let backend = WasapiBackend::new(config)?;
    Ok(Box::new(backend))
}

#[cfg(not(target_os = "windows"))]
fn open_backend(_config: HardwareConfig) -> Result<Box<dyn BackendProvider>, BackendError> {
    Err(WasapiError::UnsupportedPlatform.into())
}
