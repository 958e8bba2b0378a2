use crate::models::endpoint::{DriverDescriptor, DriverInfo};
use crate::models::error::BackendError;
use crate::models::gain::Gain;
use crate::models::state::BackendKind;
use crate::models::telemetry::{silent_spectrum, SPECTRUM_BANDS, TELEMETRY_MAX};
use crate::traits::backend_provider::BackendProvider;
use crate::traits::synthetic_source::SyntheticSource;

use super::synthetic::RandomSource;

/// Driver id of the one driver the simulated backend exposes.
pub const SIMULATED_DRIVER_ID: &str = "sim";

const SIMULATED_CHANNELS: u16 = 2;
const SIMULATED_BUFFER_SIZE: u32 = 1024;

/// Software stand-in with no external dependency.
///
/// `initialize` always succeeds; every other lifecycle call succeeds once
/// initialized. Telemetry is drawn from a [`SyntheticSource`], one draw per
/// value, and reads as silence while not processing.
pub struct SimulatedBackend {
    driver_name: String,
    source: Box<dyn SyntheticSource>,
    initialized: bool,
    processing: bool,
    gain: Gain,
    initialize_failure: Option<BackendError>,
}

impl SimulatedBackend {
    pub fn new(driver_name: impl Into<String>) -> Self {
        Self::with_source(driver_name, Box::new(RandomSource::new()))
    }

    pub fn with_source(driver_name: impl Into<String>, source: Box<dyn SyntheticSource>) -> Self {
        Self {
            driver_name: driver_name.into(),
            source,
            initialized: false,
            processing: false,
            gain: Gain::UNITY,
            initialize_failure: None,
        }
    }

    /// Backend whose `initialize` reports `error`, for exercising paths
    /// where no backend can serve a call.
    #[cfg(test)]
    pub(crate) fn failing_initialize(mut self, error: BackendError) -> Self {
        self.initialize_failure = Some(error);
        self
    }

    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn gain(&self) -> Gain {
        self.gain
    }

    pub fn descriptor(&self) -> DriverDescriptor {
        DriverDescriptor {
            input_channels: Some(SIMULATED_CHANNELS),
            output_channels: Some(SIMULATED_CHANNELS),
            preferred_buffer_size: Some(SIMULATED_BUFFER_SIZE),
            ..DriverDescriptor::simulated(SIMULATED_DRIVER_ID, self.driver_name.clone())
        }
    }

    fn draw(&mut self) -> f32 {
        self.source.next_unit() * TELEMETRY_MAX
    }
}

impl BackendProvider for SimulatedBackend {
    fn name(&self) -> &str {
        "simulated"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Simulated
    }

    fn initialize(&mut self, driver_name: &str) -> Result<DriverInfo, BackendError> {
        if let Some(error) = self.initialize_failure.clone() {
            return Err(error);
        }
        self.initialized = true;
        log::debug!("Simulated backend initialized for driver '{}'", driver_name);
        Ok(DriverInfo {
            driver_name: driver_name.to_string(),
            input_channels: SIMULATED_CHANNELS,
            output_channels: SIMULATED_CHANNELS,
            buffer_size: SIMULATED_BUFFER_SIZE,
            sample_rate: None,
        })
    }

    fn start(&mut self, gain: Gain) -> Result<(), BackendError> {
        if !self.initialized {
            return Err(BackendError::NotInitialized);
        }
        self.gain = gain;
        self.processing = true;
        log::debug!("Simulated processing started with gain {:.2}", gain.value());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        if !self.initialized {
            return Err(BackendError::NotInitialized);
        }
        self.processing = false;
        Ok(())
    }

    fn set_gain(&mut self, gain: Gain) -> Result<(), BackendError> {
        if !self.initialized {
            return Err(BackendError::NotInitialized);
        }
        self.gain = gain;
        Ok(())
    }

    fn input_level(&mut self) -> Result<f32, BackendError> {
        if !self.processing {
            return Ok(0.0);
        }
        Ok(self.draw())
    }

    fn spectrum(&mut self) -> Result<Vec<f32>, BackendError> {
        if !self.processing {
            return Ok(silent_spectrum());
        }
        Ok((0..SPECTRUM_BANDS).map(|_| self.draw()).collect())
    }

    fn raw_devices(&mut self) -> Result<Vec<DriverDescriptor>, BackendError> {
        Ok(vec![self.descriptor()])
    }
}
