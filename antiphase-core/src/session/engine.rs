use std::sync::Arc;

use parking_lot::Mutex;

use crate::backend::mediator::{BackendMediator, Negotiation};
use crate::backend::simulated::SimulatedBackend;
use crate::catalog::endpoint_catalog::EndpointCatalog;
use crate::models::config::EngineConfig;
use crate::models::endpoint::{Direction, DriverInfo, Endpoint, EndpointId};
use crate::models::error::{BackendError, SessionError};
use crate::models::gain::Gain;
use crate::models::state::{BackendKind, SessionState, SessionStatus, StopOutcome};
use crate::traits::backend_provider::BackendProvider;
use crate::traits::session_observer::SessionObserver;
use crate::traits::synthetic_source::SyntheticSource;

/// The single mutable audio-processing context.
struct Session {
    state: SessionState,
    backend_kind: BackendKind,
    selected_driver_name: Option<String>,
    input_endpoint_id: Option<EndpointId>,
    output_endpoint_id: Option<EndpointId>,
    gain: Gain,
    driver_info: Option<DriverInfo>,
    last_error: Option<String>,
}

/// Everything guarded by the engine lock.
struct EngineCore {
    session: Session,
    mediator: BackendMediator,
    catalog: EndpointCatalog,
    endpoints: Option<Vec<Endpoint>>,
}

/// Owns the session lifecycle and mediates every backend call.
///
/// ```text
/// [ControlSurface] → SessionEngine ─┬→ EndpointCatalog
///                                   └→ BackendMediator ─┬→ hardware (optional)
///                                                       └→ SimulatedBackend
/// ```
///
/// All operations are serialized by one `parking_lot::Mutex`. Failures are
/// returned as `SessionError` values and the session keeps reflecting the
/// last operation that succeeded. Share between threads with `Arc`.
pub struct SessionEngine {
    core: Mutex<EngineCore>,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl SessionEngine {
    /// Build an engine from the outcome of constructing the hardware backend.
    ///
    /// Capability negotiation happens here, once.
    pub fn new(config: EngineConfig, hardware: Result<Box<dyn BackendProvider>, BackendError>) -> Self {
        let simulated = SimulatedBackend::new(config.simulated_driver_name.clone());
        Self::with_simulated(config, hardware, simulated)
    }

    /// Like [`SessionEngine::new`] with a custom telemetry source for the
    /// simulated backend.
    pub fn with_simulated_source(
        config: EngineConfig,
        hardware: Result<Box<dyn BackendProvider>, BackendError>,
        source: Box<dyn SyntheticSource>,
    ) -> Self {
        let simulated = SimulatedBackend::with_source(config.simulated_driver_name.clone(), source);
        Self::with_simulated(config, hardware, simulated)
    }

    /// Engine that never touches hardware.
    pub fn simulated_only(config: EngineConfig) -> Self {
        Self::new(config, Err(BackendError::Unavailable("hardware disabled".into())))
    }

    fn with_simulated(
        config: EngineConfig,
        hardware: Result<Box<dyn BackendProvider>, BackendError>,
        simulated: SimulatedBackend,
    ) -> Self {
        let mediator = BackendMediator::negotiate(hardware, simulated);
        let session = Session {
            state: SessionState::Uninitialized,
            backend_kind: mediator.preferred_kind(),
            selected_driver_name: None,
            input_endpoint_id: None,
            output_endpoint_id: None,
            gain: config.default_gain,
            driver_info: None,
            last_error: None,
        };

        Self {
            core: Mutex::new(EngineCore {
                session,
                mediator,
                catalog: EndpointCatalog::new(config.simulated_driver_name),
                endpoints: None,
            }),
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observer = Some(observer);
    }

    /// Run a discovery pass and keep it for endpoint resolution.
    pub fn discover(&self) -> Vec<Endpoint> {
        self.core.lock().discover()
    }

    /// Open the driver owning `endpoint_id`.
    pub fn initialize(&self, endpoint_id: &str) -> Result<DriverInfo, SessionError> {
        self.run("initialize", |core| core.initialize(endpoint_id))
    }

    /// Start phase inversion. `None` keeps the session gain.
    pub fn start(
        &self,
        gain: Option<Gain>,
        input_endpoint_id: &str,
        output_endpoint_id: &str,
    ) -> Result<(), SessionError> {
        self.run("start", |core| core.start(gain, input_endpoint_id, output_endpoint_id))
    }

    /// Stop phase inversion. Calling it while stopped is a no-op.
    pub fn stop(&self) -> Result<StopOutcome, SessionError> {
        self.run("stop", EngineCore::stop)
    }

    pub fn set_gain(&self, gain: Gain) -> Result<(), SessionError> {
        self.run("set_gain", |core| core.set_gain(gain))
    }

    pub fn status(&self) -> SessionStatus {
        self.core.lock().status()
    }

    pub fn state(&self) -> SessionState {
        self.core.lock().session.state
    }

    pub fn negotiation(&self) -> Negotiation {
        self.core.lock().mediator.negotiation().clone()
    }

    /// Run `read` against the mediator while processing, under the engine lock.
    ///
    /// Returns `None` without touching any backend when not processing.
    pub(crate) fn with_processing_backend<T>(
        &self,
        read: impl FnOnce(&mut BackendMediator) -> T,
    ) -> Option<T> {
        let mut core = self.core.lock();
        if !core.session.state.is_processing() {
            return None;
        }
        Some(read(&mut core.mediator))
    }

    /// Lock, run a lifecycle operation, then notify the observer unlocked.
    fn run<T>(
        &self,
        operation: &str,
        op: impl FnOnce(&mut EngineCore) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let (result, before, after) = {
            let mut core = self.core.lock();
            let before = core.status();
            let result = op(&mut *core);
            match &result {
                Ok(_) => core.session.last_error = None,
                Err(e) => {
                    log::error!("Session {} failed: {}", operation, e);
                    core.session.last_error = Some(e.to_string());
                }
            }
            let after = core.status();
            (result, before, after)
        };

        if let Some(ref observer) = self.observer {
            match &result {
                Ok(_) if before != after => observer.on_state_changed(&after),
                Ok(_) => {}
                Err(e) => observer.on_error(e),
            }
        }
        result
    }
}

impl EngineCore {
    fn status(&self) -> SessionStatus {
        let session = &self.session;
        SessionStatus {
            state: session.state,
            backend_kind: session.backend_kind,
            selected_driver_name: session.selected_driver_name.clone(),
            input_endpoint_id: session.input_endpoint_id.clone(),
            output_endpoint_id: session.output_endpoint_id.clone(),
            gain: session.gain,
            hardware_available: self.mediator.negotiation().hardware_available(),
            driver_info: session.driver_info.clone(),
            last_error: session.last_error.clone(),
        }
    }

    fn discover(&mut self) -> Vec<Endpoint> {
        let endpoints = self.catalog.discover(&mut self.mediator);
        log::info!("Discovered {} endpoint(s)", endpoints.len());
        self.endpoints = Some(endpoints.clone());
        endpoints
    }

    /// Find `id` in the latest discovery, discovering first if needed.
    fn resolve(&mut self, id: &EndpointId) -> Result<Endpoint, SessionError> {
        if self.endpoints.is_none() {
            self.discover();
        }
        self.endpoints
            .iter()
            .flatten()
            .find(|endpoint| &endpoint.id == id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownEndpoint(id.to_string()))
    }

    fn resolve_bound(&mut self, raw: &str, direction: Direction) -> Result<EndpointId, SessionError> {
        let id: EndpointId = raw.parse()?;
        if id.direction() != direction {
            return Err(SessionError::InvalidEndpointId(format!(
                "{} is not an {} endpoint",
                raw,
                direction.prefix()
            )));
        }
        self.resolve(&id)?;
        Ok(id)
    }

    fn initialize(&mut self, raw_id: &str) -> Result<DriverInfo, SessionError> {
        let state = self.session.state;
        if !state.can_initialize() {
            return Err(SessionError::Precondition(format!(
                "cannot initialize while {}; stop first",
                state
            )));
        }

        let id: EndpointId = raw_id.parse()?;
        let endpoint = self.resolve(&id)?;

        match self.mediator.initialize(&endpoint.driver_name) {
            Ok(served) => {
                log::info!(
                    "Initialized driver '{}' on {} backend",
                    endpoint.driver_name,
                    served.served_by
                );
                let session = &mut self.session;
                session.state = SessionState::Initialized;
                session.backend_kind = served.served_by;
                session.selected_driver_name = Some(endpoint.driver_name);
                session.driver_info = Some(served.value.clone());
                Ok(served.value)
            }
            Err(e) => {
                let session = &mut self.session;
                session.state = state.after_failed_initialize();
                if session.state == SessionState::Faulted {
                    session.selected_driver_name = None;
                    session.driver_info = None;
                }
                Err(e.into())
            }
        }
    }

    fn start(&mut self, gain: Option<Gain>, input: &str, output: &str) -> Result<(), SessionError> {
        let state = self.session.state;
        if !state.is_initialized() {
            return Err(SessionError::Precondition(format!(
                "cannot start while {}; initialize first",
                state
            )));
        }

        let input_id = self.resolve_bound(input, Direction::Input)?;
        let output_id = self.resolve_bound(output, Direction::Output)?;
        let gain = gain.unwrap_or(self.session.gain);

        let served = self.mediator.start(gain)?;
        log::info!(
            "Processing {} -> {} at gain {:.2} on {} backend",
            input_id,
            output_id,
            gain.value(),
            served.served_by
        );

        let session = &mut self.session;
        session.state = SessionState::Processing;
        session.backend_kind = served.served_by;
        session.input_endpoint_id = Some(input_id);
        session.output_endpoint_id = Some(output_id);
        session.gain = gain;
        Ok(())
    }

    fn stop(&mut self) -> Result<StopOutcome, SessionError> {
        if !self.session.state.is_processing() {
            log::debug!("Stop ignored while {}", self.session.state);
            return Ok(StopOutcome::AlreadyStopped);
        }

        let served = self.mediator.stop()?;
        log::info!("Processing stopped on {} backend", served.served_by);

        let session = &mut self.session;
        session.state = SessionState::Initialized;
        session.backend_kind = served.served_by;
        session.input_endpoint_id = None;
        session.output_endpoint_id = None;
        Ok(StopOutcome::Stopped)
    }

    fn set_gain(&mut self, gain: Gain) -> Result<(), SessionError> {
        match self.session.state {
            SessionState::Processing => {
                let served = self.mediator.set_gain(gain)?;
                self.session.backend_kind = served.served_by;
            }
            SessionState::Initialized => {}
            state => {
                return Err(SessionError::Precondition(format!(
                    "cannot set gain while {}",
                    state
                )));
            }
        }
        log::debug!("Gain set to {:.2}", gain.value());
        self.session.gain = gain;
        Ok(())
    }
}
