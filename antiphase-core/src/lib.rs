//! # antiphase-core
//!
//! Platform-agnostic core of the antiphase noise canceller.
//!
//! Discovers audio endpoints, runs a phase-inversion session against a
//! hardware backend or a simulated fallback, and serves level/spectrum
//! telemetry. Platform backends (Windows WASAPI) implement the
//! `BackendProvider` trait and are handed to `SessionEngine::new`.
//!
//! ## Architecture
//!
//! ```text
//! antiphase-core (this crate)
//! ├── traits/       ← BackendProvider, SessionObserver, SyntheticSource
//! ├── models/       ← Endpoint, EndpointId, Gain, SessionState, errors, config
//! ├── backend/      ← SimulatedBackend, BackendMediator (negotiation + fallback)
//! ├── catalog/      ← EndpointCatalog
//! ├── session/      ← SessionEngine
//! ├── telemetry/    ← TelemetrySampler
//! ├── control/      ← ControlRequest/ControlResponse, ControlSurface
//! └── processing/   ← PhaseInverter, level meter, SpectrumAnalyzer, FIFOs, channel conversion
//! ```

pub mod backend;
pub mod catalog;
pub mod control;
pub mod models;
pub mod processing;
pub mod session;
pub mod telemetry;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use backend::mediator::{BackendMediator, Negotiation, Served};
pub use backend::simulated::SimulatedBackend;
pub use backend::synthetic::{RandomSource, SequenceSource};
pub use catalog::endpoint_catalog::EndpointCatalog;
pub use control::messages::{Ack, ControlRequest, ControlResponse};
pub use control::surface::ControlSurface;
pub use models::config::{EngineConfig, HardwareConfig};
pub use models::endpoint::{Direction, DriverDescriptor, DriverInfo, Endpoint, EndpointId};
pub use models::error::{BackendError, ConfigError, SessionError};
pub use models::gain::Gain;
pub use models::state::{BackendKind, SessionState, SessionStatus, StopOutcome};
pub use models::telemetry::{TelemetrySample, SPECTRUM_BANDS};
pub use processing::buffers::{AnalysisWindow, SampleFifo};
pub use processing::phase_inverter::{PhaseInverter, SharedGain};
pub use processing::spectrum::SpectrumAnalyzer;
pub use session::engine::SessionEngine;
pub use telemetry::sampler::TelemetrySampler;
pub use traits::backend_provider::{BackendProvider, Capabilities, Capability};
pub use traits::session_observer::SessionObserver;
pub use traits::synthetic_source::SyntheticSource;
