use std::sync::Arc;

use crate::models::telemetry::{clamp_telemetry, silent_spectrum, TelemetrySample, SPECTRUM_BANDS};
use crate::session::engine::SessionEngine;

/// Pull-based telemetry reads for a shared engine.
///
/// Reads while not processing return silence without touching any
/// backend. Failures read as silence too; values are clamped to `[0, 100]`.
#[derive(Clone)]
pub struct TelemetrySampler {
    engine: Arc<SessionEngine>,
}

impl TelemetrySampler {
    pub fn new(engine: Arc<SessionEngine>) -> Self {
        Self { engine }
    }

    pub fn sample_level(&self) -> f32 {
        self.engine
            .with_processing_backend(|mediator| match mediator.input_level() {
                Ok(served) => clamp_telemetry(served.value),
                Err(e) => {
                    log::debug!("Level read failed: {}", e);
                    0.0
                }
            })
            .unwrap_or(0.0)
    }

    /// Always exactly `SPECTRUM_BANDS` values.
    pub fn sample_spectrum(&self) -> Vec<f32> {
        self.engine
            .with_processing_backend(|mediator| match mediator.spectrum() {
                Ok(served) if served.value.len() == SPECTRUM_BANDS => {
                    served.value.into_iter().map(clamp_telemetry).collect()
                }
                Ok(served) => {
                    log::debug!("Spectrum read returned {} bands", served.value.len());
                    silent_spectrum()
                }
                Err(e) => {
                    log::debug!("Spectrum read failed: {}", e);
                    silent_spectrum()
                }
            })
            .unwrap_or_else(silent_spectrum)
    }

    pub fn sample(&self) -> TelemetrySample {
        TelemetrySample {
            input_level: self.sample_level(),
            spectrum: self.sample_spectrum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::synthetic::SequenceSource;
    use crate::backend::test_support::StubBackend;
    use crate::models::config::EngineConfig;
    use crate::models::error::BackendError;
    use crate::models::gain::Gain;
    use crate::models::state::SessionState;

    fn sampler_with(values: Vec<f32>) -> (Arc<SessionEngine>, TelemetrySampler) {
        let engine = Arc::new(SessionEngine::with_simulated_source(
            EngineConfig::default(),
            Err(BackendError::Unavailable("test".into())),
            Box::new(SequenceSource::new(values)),
        ));
        let sampler = TelemetrySampler::new(Arc::clone(&engine));
        (engine, sampler)
    }

    #[test]
    fn silent_whenever_not_processing() {
        let (engine, sampler) = sampler_with(vec![0.9]);
        assert_eq!(sampler.sample(), TelemetrySample::silent());

        engine.initialize("input_sim").unwrap();
        assert_eq!(sampler.sample_level(), 0.0);
        assert_eq!(sampler.sample_spectrum(), vec![0.0; SPECTRUM_BANDS]);

        engine.start(None, "input_sim", "output_sim").unwrap();
        engine.stop().unwrap();
        assert_eq!(sampler.sample(), TelemetrySample::silent());
    }

    #[test]
    fn processing_spectrum_is_bounded() {
        let (engine, sampler) = sampler_with(vec![0.0, 0.25, 0.99, 1.0]);
        engine.initialize("input_sim").unwrap();
        engine.start(Some(Gain::UNITY), "input_sim", "output_sim").unwrap();
        assert_eq!(engine.state(), SessionState::Processing);

        let spectrum = sampler.sample_spectrum();

        assert_eq!(spectrum.len(), SPECTRUM_BANDS);
        assert!(spectrum.iter().all(|v| (0.0..=100.0).contains(v)));
        assert_eq!(spectrum[1], 25.0);
    }

    #[test]
    fn out_of_range_hardware_level_is_clamped() {
        let (probe, script) = StubBackend::probe();
        script.lock().level = 250.0;
        let engine = Arc::new(SessionEngine::new(EngineConfig::default(), probe));
        let sampler = TelemetrySampler::new(Arc::clone(&engine));
        engine.initialize("input_0").unwrap();
        engine.start(None, "input_0", "output_0").unwrap();

        assert_eq!(sampler.sample_level(), 100.0);
        assert_eq!(sampler.sample_spectrum(), vec![100.0; SPECTRUM_BANDS]);
    }

    #[test]
    fn not_processing_never_touches_backend() {
        let (probe, script) = StubBackend::probe();
        let engine = Arc::new(SessionEngine::new(EngineConfig::default(), probe));
        let sampler = TelemetrySampler::new(Arc::clone(&engine));
        engine.initialize("input_0").unwrap();

        sampler.sample();

        let calls = script.lock().calls.clone();
        assert_eq!(calls.input_level, 0);
        assert_eq!(calls.spectrum, 0);
    }

    #[test]
    fn hardware_telemetry_failure_falls_back() {
        let (probe, script) = StubBackend::probe();
        let engine = Arc::new(SessionEngine::with_simulated_source(
            EngineConfig::default(),
            probe,
            Box::new(SequenceSource::constant(0.25)),
        ));
        let sampler = TelemetrySampler::new(Arc::clone(&engine));
        engine.initialize("input_0").unwrap();
        engine.start(None, "input_0", "output_0").unwrap();
        script.lock().fail_telemetry = true;

        assert_eq!(sampler.sample_level(), 25.0);
        assert_eq!(sampler.sample_spectrum(), vec![25.0; SPECTRUM_BANDS]);
    }
}
