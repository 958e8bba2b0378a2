use serde::Serialize;

/// Amplitude applied to the inverted signal.
///
/// Always within `[Gain::MIN, Gain::MAX]`; out-of-range input is clamped
/// and NaN falls back to unity.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Gain(f32);

impl Gain {
    pub const MIN: f32 = 0.0;
    pub const MAX: f32 = 2.0;
    pub const UNITY: Gain = Gain(1.0);

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::UNITY;
        }
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for Gain {
    fn default() -> Self {
        Self::UNITY
    }
}

impl From<f32> for Gain {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}
