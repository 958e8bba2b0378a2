use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::models::endpoint::{DriverDescriptor, DriverInfo};
use crate::models::error::BackendError;
use crate::models::gain::Gain;
use crate::models::state::BackendKind;
use crate::models::telemetry::SPECTRUM_BANDS;
use crate::traits::backend_provider::{BackendProvider, Capability};

use super::simulated::SimulatedBackend;

/// Outcome of the one-time hardware capability negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiation {
    /// Name of the accepted hardware backend, if any.
    pub hardware_backend: Option<String>,
    /// Why hardware was rejected, if it was.
    pub degraded_reason: Option<String>,
}

impl Negotiation {
    pub fn hardware_available(&self) -> bool {
        self.hardware_backend.is_some()
    }
}

/// A value together with the backend that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Served<T> {
    pub value: T,
    pub served_by: BackendKind,
    /// Hardware error that triggered a fallback for this call.
    pub recovered_from: Option<BackendError>,
}

impl<T> Served<T> {
    fn direct(value: T, served_by: BackendKind) -> Self {
        Self {
            value,
            served_by,
            recovered_from: None,
        }
    }
}

/// Whether a successful hardware call is mirrored onto the simulated backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shadow {
    Mirror,
    Skip,
}

/// Mediates every backend call for the session engine.
///
/// Holds the hardware backend accepted at negotiation (if any) and a
/// simulated backend that is always present. Hardware calls that fail,
/// panic, or return malformed data fall back to the simulated equivalent
/// for that call only. Successful hardware lifecycle calls are mirrored
/// onto the simulated backend so it can stand in at any point of a run.
///
/// Two calls pin later traffic to simulation. An `initialize` served by
/// simulation leaves the hardware without a trusted driver, so lifecycle
/// calls skip it until a hardware `initialize` succeeds again. Telemetry
/// only asks the hardware while a hardware `start` is in effect.
pub struct BackendMediator {
    hardware: Option<Box<dyn BackendProvider>>,
    simulated: SimulatedBackend,
    negotiation: Negotiation,
    detached: bool,
    hardware_streaming: bool,
}

impl BackendMediator {
    /// Decide once which backend drives the process.
    ///
    /// `probe` is the result of constructing the hardware backend. A failed
    /// construction or a backend missing any required capability degrades
    /// permanently to simulation. Never fails.
    pub fn negotiate(
        probe: Result<Box<dyn BackendProvider>, BackendError>,
        simulated: SimulatedBackend,
    ) -> Self {
        let (hardware, negotiation) = match probe {
            Ok(backend) => {
                let missing = backend.capabilities().missing_required();
                if missing.is_empty() {
                    log::info!("Using hardware backend '{}'", backend.name());
                    let negotiation = Negotiation {
                        hardware_backend: Some(backend.name().to_string()),
                        degraded_reason: None,
                    };
                    (Some(backend), negotiation)
                } else {
                    let names: Vec<String> = missing.iter().map(|c| c.to_string()).collect();
                    log::warn!(
                        "Hardware backend '{}' lacks required operations [{}]; using simulation",
                        backend.name(),
                        names.join(", ")
                    );
                    let negotiation = Negotiation {
                        hardware_backend: None,
                        degraded_reason: Some(BackendError::MissingCapability(missing[0]).to_string()),
                    };
                    (None, negotiation)
                }
            }
            Err(e) => {
                log::warn!("Hardware backend unavailable ({}); using simulation", e);
                let negotiation = Negotiation {
                    hardware_backend: None,
                    degraded_reason: Some(e.to_string()),
                };
                (None, negotiation)
            }
        };

        Self {
            hardware,
            simulated,
            negotiation,
            detached: false,
            hardware_streaming: false,
        }
    }

    /// Mediator that never tries hardware.
    pub fn simulated_only(simulated: SimulatedBackend) -> Self {
        Self::negotiate(
            Err(BackendError::Unavailable("hardware disabled".into())),
            simulated,
        )
    }

    pub fn negotiation(&self) -> &Negotiation {
        &self.negotiation
    }

    /// The provider tried first for every call.
    pub fn preferred_kind(&self) -> BackendKind {
        if self.hardware.is_some() {
            BackendKind::Hardware
        } else {
            BackendKind::Simulated
        }
    }

    pub fn simulated(&self) -> &SimulatedBackend {
        &self.simulated
    }

    /// Whether lifecycle calls currently bypass the hardware.
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn initialize(&mut self, driver_name: &str) -> Result<Served<DriverInfo>, BackendError> {
        let result =
            self.call(Capability::Initialize, Shadow::Mirror, |b| b.initialize(driver_name), accept_any);
        self.hardware_streaming = false;
        self.detached = !matches!(&result, Ok(served) if served.served_by == BackendKind::Hardware);
        if self.detached && self.hardware.is_some() {
            log::warn!(
                "Driver '{}' is not open on hardware; session runs on simulation until the next initialize",
                driver_name
            );
        }
        result
    }

    pub fn start(&mut self, gain: Gain) -> Result<Served<()>, BackendError> {
        let result = self.call(Capability::Start, Shadow::Mirror, |b| b.start(gain), accept_any);
        self.hardware_streaming =
            matches!(&result, Ok(served) if served.served_by == BackendKind::Hardware);
        result
    }

    pub fn stop(&mut self) -> Result<Served<()>, BackendError> {
        let result = self.call(Capability::Stop, Shadow::Mirror, |b| b.stop(), accept_any);
        if result.is_ok() {
            self.hardware_streaming = false;
        }
        result
    }

    pub fn set_gain(&mut self, gain: Gain) -> Result<Served<()>, BackendError> {
        self.call(Capability::SetGain, Shadow::Mirror, |b| b.set_gain(gain), accept_any)
    }

    pub fn input_level(&mut self) -> Result<Served<f32>, BackendError> {
        self.call(Capability::InputLevel, Shadow::Skip, |b| b.input_level(), check_level)
    }

    pub fn spectrum(&mut self) -> Result<Served<Vec<f32>>, BackendError> {
        self.call(Capability::Spectrum, Shadow::Skip, |b| b.spectrum(), check_spectrum)
    }

    pub fn raw_devices(&mut self) -> Result<Served<Vec<DriverDescriptor>>, BackendError> {
        self.call(Capability::RawDevices, Shadow::Skip, |b| b.raw_devices(), accept_any)
    }

    fn call<T>(
        &mut self,
        operation: Capability,
        shadow: Shadow,
        mut op: impl FnMut(&mut dyn BackendProvider) -> Result<T, BackendError>,
        check: fn(&T) -> Result<(), BackendError>,
    ) -> Result<Served<T>, BackendError> {
        let bypass = self.bypasses_hardware(operation);
        let hardware = match self.hardware.as_mut() {
            Some(hardware) if !bypass => hardware,
            _ => {
                let value = op(&mut self.simulated)?;
                check(&value)?;
                return Ok(Served::direct(value, BackendKind::Simulated));
            }
        };

        // Optional operations the hardware lacks are served by simulation.
        let attempt = if hardware.capabilities().contains(operation) {
            guarded(|| op(hardware.as_mut())).and_then(|value| check(&value).map(|_| value))
        } else {
            Err(BackendError::MissingCapability(operation))
        };
        match attempt {
            Ok(value) => {
                if shadow == Shadow::Mirror {
                    if let Err(e) = op(&mut self.simulated) {
                        log::debug!("Simulated mirror of {} failed: {}", operation, e);
                    }
                }
                Ok(Served::direct(value, BackendKind::Hardware))
            }
            Err(error) => {
                if shadow == Shadow::Mirror {
                    log::warn!("Hardware {} failed ({}); falling back to simulation", operation, error);
                } else {
                    log::debug!("Hardware {} failed ({}); falling back to simulation", operation, error);
                }
                let value = op(&mut self.simulated).map_err(|fallback_error| {
                    log::error!(
                        "Simulated fallback for {} also failed: {}",
                        operation,
                        fallback_error
                    );
                    fallback_error
                })?;
                check(&value)?;
                Ok(Served {
                    value,
                    served_by: BackendKind::Simulated,
                    recovered_from: Some(error),
                })
            }
        }
    }

    fn bypasses_hardware(&self, operation: Capability) -> bool {
        match operation {
            Capability::Start | Capability::Stop | Capability::SetGain => self.detached,
            Capability::InputLevel | Capability::Spectrum => !self.hardware_streaming,
            Capability::Initialize | Capability::RawDevices => false,
        }
    }
}

fn accept_any<T>(_: &T) -> Result<(), BackendError> {
    Ok(())
}

fn check_level(level: &f32) -> Result<(), BackendError> {
    if level.is_finite() && *level >= 0.0 {
        Ok(())
    } else {
        Err(BackendError::Malformed(format!("input level {}", level)))
    }
}

fn check_spectrum(bands: &Vec<f32>) -> Result<(), BackendError> {
    if bands.len() != SPECTRUM_BANDS {
        return Err(BackendError::Malformed(format!(
            "spectrum has {} bands, expected {}",
            bands.len(),
            SPECTRUM_BANDS
        )));
    }
    if let Some(bad) = bands.iter().find(|b| !b.is_finite() || **b < 0.0) {
        return Err(BackendError::Malformed(format!("spectrum magnitude {}", bad)));
    }
    Ok(())
}

/// Run a hardware call, converting a panic into `BackendError::Panicked`.
fn guarded<T>(call: impl FnOnce() -> Result<T, BackendError>) -> Result<T, BackendError> {
    panic::catch_unwind(AssertUnwindSafe(call))
        .unwrap_or_else(|payload| Err(BackendError::Panicked(panic_message(payload))))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".into()
    }
}
