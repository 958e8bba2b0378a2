//! Input level metering.

use std::f32::consts::SQRT_2;

use crate::models::telemetry::TELEMETRY_MAX;

/// RMS of the finite samples in `samples` (0.0 for an empty or all-invalid block).
pub fn rms(samples: &[f32]) -> f32 {
    let (sum_sq, count) = samples
        .iter()
        .filter(|s| s.is_finite())
        .fold((0.0f64, 0usize), |(sum, n), &s| (sum + (s as f64) * (s as f64), n + 1));
    if count == 0 {
        return 0.0;
    }
    (sum_sq / count as f64).sqrt() as f32
}

/// Level as a percentage of a full-scale sine.
///
/// A sine at full scale has an RMS of 1/√2, so the RMS is scaled by √2
/// before being capped at 100.
pub fn level_percent(samples: &[f32]) -> f32 {
    (rms(samples) * SQRT_2).min(1.0) * TELEMETRY_MAX
}
