//! Band spectrum for visualization.

use std::f32::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::models::telemetry::{silent_spectrum, SPECTRUM_BANDS, TELEMETRY_MAX};

/// Folds an FFT of the most recent input into [`SPECTRUM_BANDS`] magnitudes.
///
/// Bands split the positive-frequency bins evenly. Each band's mean power is
/// tilted down towards the top band (`1 - 0.5 * band / bands`), normalized to
/// the loudest band and displayed as `sqrt(power) * 100`.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    size: usize,
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    /// `size` must be a power of two and at least twice the band count.
    pub fn new(size: usize) -> Self {
        let size = size.max(SPECTRUM_BANDS * 2).next_power_of_two();
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let window = (0..size)
            .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
            .collect();

        Self {
            fft,
            size,
            window,
            scratch: vec![Complex::new(0.0, 0.0); size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Analyze the newest `size` samples of `samples` (zero-padded in front
    /// when shorter). Returns exactly [`SPECTRUM_BANDS`] values in `[0, 100]`.
    pub fn analyze(&mut self, samples: &[f32]) -> Vec<f32> {
        if samples.is_empty() {
            return silent_spectrum();
        }

        let tail = &samples[samples.len().saturating_sub(self.size)..];
        let pad = self.size - tail.len();
        for (i, slot) in self.scratch.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { tail[i - pad] };
            let sample = if sample.is_finite() { sample } else { 0.0 };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.scratch);

        let bins = self.size / 2;
        let bins_per_band = bins / SPECTRUM_BANDS;
        let mut energies = [0.0f32; SPECTRUM_BANDS];
        for (band, energy) in energies.iter_mut().enumerate() {
            let start = band * bins_per_band;
            let end = start + bins_per_band;
            let power: f32 = self.scratch[start..end].iter().map(|c| c.norm_sqr()).sum();
            let tilt = 1.0 - 0.5 * band as f32 / SPECTRUM_BANDS as f32;
            *energy = power / bins_per_band as f32 * tilt;
        }

        let max_energy = energies.iter().copied().fold(0.0f32, f32::max);
        if max_energy <= f32::MIN_POSITIVE {
            return silent_spectrum();
        }

        energies
            .iter()
            .map(|e| ((e / max_energy).sqrt() * TELEMETRY_MAX).min(TELEMETRY_MAX))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tone(freq_bin: f32, size: usize) -> Vec<f32> {
        (0..size)
            .map(|i| (2.0 * PI * freq_bin * i as f32 / size as f32).sin())
            .collect()
    }

    #[test]
    fn silence_yields_zeros() {
        let mut analyzer = SpectrumAnalyzer::new(1024);
        assert_eq!(analyzer.analyze(&[0.0; 1024]), vec![0.0; SPECTRUM_BANDS]);
        assert_eq!(analyzer.analyze(&[]), vec![0.0; SPECTRUM_BANDS]);
    }

    #[test]
    fn always_returns_band_count_in_range() {
        let mut analyzer = SpectrumAnalyzer::new(1024);
        let noise: Vec<f32> = (0..3000).map(|i| ((i * 7919) % 101) as f32 / 50.0 - 1.0).collect();

        let bands = analyzer.analyze(&noise);

        assert_eq!(bands.len(), SPECTRUM_BANDS);
        assert!(bands.iter().all(|b| (0.0..=100.0).contains(b)));
    }

    #[test]
    fn low_tone_peaks_in_first_band() {
        let mut analyzer = SpectrumAnalyzer::new(1024);
        // 512 bins over 32 bands: 16 bins per band, bin 8 is in band 0.
        let bands = analyzer.analyze(&tone(8.0, 1024));

        assert_relative_eq!(bands[0], 100.0);
        assert!(bands[SPECTRUM_BANDS - 1] < 10.0);
    }

    #[test]
    fn high_tone_peaks_in_upper_band() {
        let mut analyzer = SpectrumAnalyzer::new(1024);
        // bin 488 is in band 30.
        let bands = analyzer.analyze(&tone(488.0, 1024));

        let loudest = bands
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(loudest, 30);
    }

    #[test]
    fn short_input_is_padded() {
        let mut analyzer = SpectrumAnalyzer::new(256);
        let bands = analyzer.analyze(&tone(4.0, 100));
        assert_eq!(bands.len(), SPECTRUM_BANDS);
    }

    #[test]
    fn size_is_rounded_to_power_of_two() {
        assert_eq!(SpectrumAnalyzer::new(1000).size(), 1024);
        assert_eq!(SpectrumAnalyzer::new(8).size(), 64);
    }
}
