//! Scriptable hardware stand-in for engine and mediator tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::endpoint::{DriverDescriptor, DriverInfo};
use crate::models::error::BackendError;
use crate::models::gain::Gain;
use crate::models::state::BackendKind;
use crate::models::telemetry::SPECTRUM_BANDS;
use crate::traits::backend_provider::{BackendProvider, Capabilities};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CallLog {
    pub initialize: usize,
    pub start: usize,
    pub stop: usize,
    pub set_gain: usize,
    pub input_level: usize,
    pub spectrum: usize,
    pub raw_devices: usize,
    pub last_driver: Option<String>,
    pub last_gain: Option<f32>,
}

#[derive(Debug)]
pub struct StubScript {
    pub capabilities: Capabilities,
    pub devices: Vec<DriverDescriptor>,
    pub fail_devices: bool,
    pub fail_initialize: bool,
    pub fail_start: bool,
    pub fail_stop: bool,
    pub fail_set_gain: bool,
    pub fail_telemetry: bool,
    pub panic_on_level: bool,
    pub malformed_spectrum: bool,
    pub level: f32,
    /// Driver left open by the last successful initialize. A failed
    /// initialize keeps it, as a real device handle would.
    pub opened: Option<String>,
    /// Driver the stub is streaming on.
    pub streaming: Option<String>,
    pub calls: CallLog,
}

impl Default for StubScript {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::all(),
            devices: vec![DriverDescriptor::new("0", "Focusrite USB")],
            fail_devices: false,
            fail_initialize: false,
            fail_start: false,
            fail_stop: false,
            fail_set_gain: false,
            fail_telemetry: false,
            panic_on_level: false,
            malformed_spectrum: false,
            level: 42.0,
            opened: None,
            streaming: None,
            calls: CallLog::default(),
        }
    }
}

pub struct StubBackend {
    script: Arc<Mutex<StubScript>>,
}

impl StubBackend {
    pub fn new() -> (Self, Arc<Mutex<StubScript>>) {
        let script = Arc::new(Mutex::new(StubScript::default()));
        (
            Self {
                script: Arc::clone(&script),
            },
            script,
        )
    }

    /// Probe result the engine receives when this stub is "installed".
    pub fn probe() -> (Result<Box<dyn BackendProvider>, BackendError>, Arc<Mutex<StubScript>>) {
        let (stub, script) = Self::new();
        (Ok(Box::new(stub)), script)
    }
}

fn driver_error(operation: &str) -> BackendError {
    BackendError::Driver(format!("stub {} failure", operation))
}

impl BackendProvider for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Hardware
    }

    fn capabilities(&self) -> Capabilities {
        self.script.lock().capabilities
    }

    fn initialize(&mut self, driver_name: &str) -> Result<DriverInfo, BackendError> {
        let mut script = self.script.lock();
        script.calls.initialize += 1;
        script.calls.last_driver = Some(driver_name.to_string());
        if script.fail_initialize {
            return Err(driver_error("initialize"));
        }
        script.opened = Some(driver_name.to_string());
        Ok(DriverInfo {
            driver_name: driver_name.to_string(),
            input_channels: 2,
            output_channels: 2,
            buffer_size: 256,
            sample_rate: Some(48_000),
        })
    }

    fn start(&mut self, gain: Gain) -> Result<(), BackendError> {
        let mut script = self.script.lock();
        script.calls.start += 1;
        script.calls.last_gain = Some(gain.value());
        if script.fail_start {
            return Err(driver_error("start"));
        }
        if script.opened.is_none() {
            return Err(BackendError::NotInitialized);
        }
        script.streaming = script.opened.clone();
        Ok(())
    }

    fn stop(&mut self) -> Result<(), BackendError> {
        let mut script = self.script.lock();
        script.calls.stop += 1;
        if script.fail_stop {
            return Err(driver_error("stop"));
        }
        script.streaming = None;
        Ok(())
    }

    fn set_gain(&mut self, gain: Gain) -> Result<(), BackendError> {
        let mut script = self.script.lock();
        script.calls.set_gain += 1;
        script.calls.last_gain = Some(gain.value());
        if script.fail_set_gain {
            return Err(driver_error("set_gain"));
        }
        Ok(())
    }

    fn input_level(&mut self) -> Result<f32, BackendError> {
        let mut script = self.script.lock();
        script.calls.input_level += 1;
        if script.panic_on_level {
            drop(script);
            panic!("stub level panic");
        }
        if script.fail_telemetry {
            return Err(driver_error("input_level"));
        }
        Ok(script.level)
    }

    fn spectrum(&mut self) -> Result<Vec<f32>, BackendError> {
        let mut script = self.script.lock();
        script.calls.spectrum += 1;
        if script.fail_telemetry {
            return Err(driver_error("spectrum"));
        }
        if script.malformed_spectrum {
            return Ok(vec![1.0; SPECTRUM_BANDS - 1]);
        }
        Ok(vec![script.level; SPECTRUM_BANDS])
    }

    fn raw_devices(&mut self) -> Result<Vec<DriverDescriptor>, BackendError> {
        let mut script = self.script.lock();
        script.calls.raw_devices += 1;
        if script.fail_devices {
            return Err(driver_error("raw_devices"));
        }
        Ok(script.devices.clone())
    }
}
