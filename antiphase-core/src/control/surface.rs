use std::sync::Arc;

use crate::models::gain::Gain;
use crate::models::state::StopOutcome;
use crate::session::engine::SessionEngine;
use crate::telemetry::sampler::TelemetrySampler;

use super::messages::{Ack, ControlRequest, ControlResponse};

/// Maps control requests onto a shared session engine.
#[derive(Clone)]
pub struct ControlSurface {
    engine: Arc<SessionEngine>,
    sampler: TelemetrySampler,
}

impl ControlSurface {
    pub fn new(engine: Arc<SessionEngine>) -> Self {
        let sampler = TelemetrySampler::new(Arc::clone(&engine));
        Self { engine, sampler }
    }

    pub fn engine(&self) -> &Arc<SessionEngine> {
        &self.engine
    }

    pub fn dispatch(&self, request: ControlRequest) -> ControlResponse {
        log::debug!("Dispatching {:?}", request);
        match request {
            ControlRequest::Discover => ControlResponse::Devices {
                devices: self.engine.discover(),
            },
            ControlRequest::Status => ControlResponse::Status(self.engine.status()),
            ControlRequest::Initialize { endpoint_id } => {
                ack(self.engine.initialize(&endpoint_id).map(|_| Ack::ok()))
            }
            ControlRequest::Start {
                gain,
                input_endpoint_id,
                output_endpoint_id,
            } => {
                let gain = gain.map(|g| Gain::new(g as f32));
                ack(self
                    .engine
                    .start(gain, &input_endpoint_id, &output_endpoint_id)
                    .map(|_| Ack::ok()))
            }
            ControlRequest::Stop => ack(self.engine.stop().map(|outcome| match outcome {
                StopOutcome::AlreadyStopped => Ack::with_message("processing already stopped"),
                StopOutcome::Stopped => Ack::ok(),
            })),
            ControlRequest::SetGain { gain } => {
                ack(self.engine.set_gain(Gain::new(gain as f32)).map(|_| Ack::ok()))
            }
            ControlRequest::InputLevel => ControlResponse::Level {
                level: self.sampler.sample_level(),
            },
            ControlRequest::Spectrum => ControlResponse::Spectrum {
                data: self.sampler.sample_spectrum(),
            },
        }
    }

    /// Parse one JSON request and dispatch it. Malformed input yields a
    /// failed acknowledgement.
    pub fn dispatch_json(&self, line: &str) -> ControlResponse {
        match serde_json::from_str::<ControlRequest>(line) {
            Ok(request) => self.dispatch(request),
            Err(e) => {
                log::warn!("Rejected control request: {}", e);
                ControlResponse::Ack(Ack::failed(format!("invalid request: {}", e)))
            }
        }
    }
}

fn ack<E: ToString>(result: Result<Ack, E>) -> ControlResponse {
    ControlResponse::Ack(result.unwrap_or_else(Ack::failed))
}
