use std::fmt;

use crate::models::endpoint::{DriverDescriptor, DriverInfo};
use crate::models::error::BackendError;
use crate::models::gain::Gain;
use crate::models::state::BackendKind;

/// An operation a backend may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Initialize,
    Start,
    Stop,
    SetGain,
    InputLevel,
    Spectrum,
    RawDevices,
}

impl Capability {
    /// Operations a backend must offer to drive a session.
    pub const REQUIRED: [Capability; 6] = [
        Capability::Initialize,
        Capability::Start,
        Capability::Stop,
        Capability::InputLevel,
        Capability::Spectrum,
        Capability::RawDevices,
    ];

    const ALL: [Capability; 7] = [
        Capability::Initialize,
        Capability::Start,
        Capability::Stop,
        Capability::SetGain,
        Capability::InputLevel,
        Capability::Spectrum,
        Capability::RawDevices,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialize => "initialize",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::SetGain => "set_gain",
            Self::InputLevel => "input_level",
            Self::Spectrum => "spectrum",
            Self::RawDevices => "raw_devices",
        };
        f.write_str(name)
    }
}

/// Set of capabilities a backend declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    bits: u8,
}

impl Capabilities {
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub fn all() -> Self {
        Capability::ALL
            .iter()
            .fold(Self::empty(), |caps, cap| caps.with(*cap))
    }

    pub fn with(self, capability: Capability) -> Self {
        Self {
            bits: self.bits | capability.bit(),
        }
    }

    pub fn without(self, capability: Capability) -> Self {
        Self {
            bits: self.bits & !capability.bit(),
        }
    }

    pub fn contains(self, capability: Capability) -> bool {
        self.bits & capability.bit() != 0
    }

    /// Required capabilities absent from this set, in declaration order.
    pub fn missing_required(self) -> Vec<Capability> {
        Capability::REQUIRED
            .iter()
            .copied()
            .filter(|cap| !self.contains(*cap))
            .collect()
    }
}

/// A provider able to run a phase-inversion session.
///
/// Implemented by:
/// - `SimulatedBackend` (this crate)
/// - `WasapiBackend` (`antiphase-windows`)
///
/// Calls are serialized by the session engine; implementations do not
/// need internal locking for their control state.
pub trait BackendProvider: Send {
    /// Human-readable backend name for logs.
    fn name(&self) -> &str;

    fn kind(&self) -> BackendKind;

    /// Operations this backend implements.
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    /// Open the named driver and prepare buffers.
    fn initialize(&mut self, driver_name: &str) -> Result<DriverInfo, BackendError>;

    /// Start inverting input into output with `gain`.
    fn start(&mut self, gain: Gain) -> Result<(), BackendError>;

    /// Stop the audio path. The driver stays open.
    fn stop(&mut self) -> Result<(), BackendError>;

    /// Change the inversion gain of a running stream.
    fn set_gain(&mut self, gain: Gain) -> Result<(), BackendError>;

    /// Current input level in `[0, 100]`.
    fn input_level(&mut self) -> Result<f32, BackendError>;

    /// Band magnitudes in `[0, 100]`, lowest band first.
    fn spectrum(&mut self) -> Result<Vec<f32>, BackendError>;

    /// Drivers this backend can open.
    fn raw_devices(&mut self) -> Result<Vec<DriverDescriptor>, BackendError>;
}
