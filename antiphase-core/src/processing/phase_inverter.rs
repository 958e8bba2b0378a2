use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::models::gain::Gain;

/// Phase inversion: `out[n] = -gain * in[n]`.
///
/// Non-finite input samples are emitted as silence so a glitching capture
/// device never drives the output to full scale.
#[derive(Debug, Clone, Copy)]
pub struct PhaseInverter {
    gain: Gain,
}

impl PhaseInverter {
    pub fn new(gain: Gain) -> Self {
        Self { gain }
    }

    pub fn gain(&self) -> Gain {
        self.gain
    }

    pub fn set_gain(&mut self, gain: Gain) {
        self.gain = gain;
    }

    pub fn process_in_place(&self, samples: &mut [f32]) {
        let factor = -self.gain.value();
        for sample in samples.iter_mut() {
            *sample = if sample.is_finite() { *sample * factor } else { 0.0 };
        }
    }
}

impl Default for PhaseInverter {
    fn default() -> Self {
        Self::new(Gain::UNITY)
    }
}

/// Gain shared lock-free between a control thread and the audio thread.
#[derive(Debug, Clone)]
pub struct SharedGain(Arc<AtomicU32>);

impl SharedGain {
    pub fn new(gain: Gain) -> Self {
        Self(Arc::new(AtomicU32::new(gain.value().to_bits())))
    }

    pub fn load(&self) -> Gain {
        Gain::new(f32::from_bits(self.0.load(Ordering::Relaxed)))
    }

    pub fn store(&self, gain: Gain) {
        self.0.store(gain.value().to_bits(), Ordering::Relaxed);
    }
}
