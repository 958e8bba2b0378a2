use super::error::ConfigError;
use super::gain::Gain;
use super::telemetry::SPECTRUM_BANDS;

/// Session engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Gain bound to the session before any `start`/`set_gain` (default: 1.0).
    pub default_gain: Gain,

    /// Driver name reported by the simulated backend.
    pub simulated_driver_name: String,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulated_driver_name.trim().is_empty() {
            return Err(ConfigError::new("simulated_driver_name", "must not be empty"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_gain: Gain::UNITY,
            simulated_driver_name: "Simulated Driver".into(),
        }
    }
}

/// Hardware duplex stream configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareConfig {
    /// Requested device buffer duration in milliseconds (default: 20).
    pub buffer_duration_ms: u32,

    /// Samples kept for level/spectrum analysis; power of two (default: 1024).
    pub analysis_window: usize,

    /// Inverted samples queued beyond this are dropped (default: 50 ms).
    pub max_latency_ms: u32,

    /// How long `start` waits for the stream thread to come up (default: 2000).
    pub startup_timeout_ms: u64,

    /// Sleep between polls of the capture/render buffers (default: 2).
    pub poll_interval_ms: u64,
}

impl HardwareConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_duration_ms == 0 {
            return Err(ConfigError::new("buffer_duration_ms", "must be positive"));
        }
        if !self.analysis_window.is_power_of_two() || self.analysis_window < SPECTRUM_BANDS * 2 {
            return Err(ConfigError::new(
                "analysis_window",
                format!(
                    "must be a power of two of at least {}, got {}",
                    SPECTRUM_BANDS * 2,
                    self.analysis_window
                ),
            ));
        }
        if self.max_latency_ms < self.buffer_duration_ms {
            return Err(ConfigError::new(
                "max_latency_ms",
                "must not be shorter than the device buffer",
            ));
        }
        if self.startup_timeout_ms == 0 {
            return Err(ConfigError::new("startup_timeout_ms", "must be positive"));
        }
        Ok(())
    }

    /// FIFO capacity in samples for a mono stream at `sample_rate`.
    pub fn max_latency_samples(&self, sample_rate: u32) -> usize {
        (sample_rate as u64 * self.max_latency_ms as u64 / 1000).max(1) as usize
    }
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            buffer_duration_ms: 20,
            analysis_window: 1024,
            max_latency_ms: 50,
            startup_timeout_ms: 2000,
            poll_interval_ms: 2,
        }
    }
}
