use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::traits::synthetic_source::SyntheticSource;

/// Uniform random draws; the default telemetry source of the simulated backend.
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticSource for RandomSource {
    fn next_unit(&mut self) -> f32 {
        self.rng.gen::<f32>()
    }
}

/// Cycles through a fixed list of values (clamped to `[0, 1]`).
///
/// An empty sequence always yields 0.
pub struct SequenceSource {
    values: Vec<f32>,
    cursor: usize,
}

impl SequenceSource {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, cursor: 0 }
    }

    pub fn constant(value: f32) -> Self {
        Self::new(vec![value])
    }
}

impl SyntheticSource for SequenceSource {
    fn next_unit(&mut self) -> f32 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = (self.cursor + 1) % self.values.len();
        if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_cycles_and_clamps() {
        let mut source = SequenceSource::new(vec![0.25, 1.5, -1.0]);
        assert_eq!(source.next_unit(), 0.25);
        assert_eq!(source.next_unit(), 1.0);
        assert_eq!(source.next_unit(), 0.0);
        assert_eq!(source.next_unit(), 0.25);
    }

    #[test]
    fn empty_sequence_is_silent() {
        assert_eq!(SequenceSource::new(Vec::new()).next_unit(), 0.0);
    }

    #[test]
    fn seeded_random_is_reproducible_and_in_range() {
        let mut a = RandomSource::seeded(7);
        let mut b = RandomSource::seeded(7);
        for _ in 0..100 {
            let value = a.next_unit();
            assert_eq!(value, b.next_unit());
            assert!((0.0..1.0).contains(&value));
        }
    }
}
