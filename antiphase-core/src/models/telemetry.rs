use serde::Serialize;

/// Number of spectrum bands in every telemetry sample.
pub const SPECTRUM_BANDS: usize = 32;

/// Upper bound of level and band magnitudes.
pub const TELEMETRY_MAX: f32 = 100.0;

/// One telemetry read: input level and band magnitudes, both in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySample {
    pub input_level: f32,
    pub spectrum: Vec<f32>,
}

impl TelemetrySample {
    pub fn silent() -> Self {
        Self {
            input_level: 0.0,
            spectrum: silent_spectrum(),
        }
    }
}

pub fn silent_spectrum() -> Vec<f32> {
    vec![0.0; SPECTRUM_BANDS]
}

/// Clamp a telemetry value into `[0, 100]`; non-finite values read as zero.
pub fn clamp_telemetry(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, TELEMETRY_MAX)
    } else {
        0.0
    }
}
