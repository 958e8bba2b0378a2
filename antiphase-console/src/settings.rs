use antiphase_core::models::config::{EngineConfig, HardwareConfig};
use antiphase_core::models::error::ConfigError;
use antiphase_core::models::gain::Gain;

/// Console settings, read from `ANTIPHASE_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub engine: EngineConfig,
    pub hardware: HardwareConfig,
    /// Skip the hardware probe entirely (`ANTIPHASE_SIMULATE=1`).
    pub simulate_only: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut engine = EngineConfig::default();
        let mut hardware = HardwareConfig::default();

        if let Some(gain) = parse::<f32>(&lookup, "ANTIPHASE_GAIN", "default_gain")? {
            engine.default_gain = Gain::new(gain);
        }
        if let Some(ms) = parse::<u32>(&lookup, "ANTIPHASE_BUFFER_MS", "buffer_duration_ms")? {
            hardware.buffer_duration_ms = ms;
        }
        if let Some(ms) = parse::<u32>(&lookup, "ANTIPHASE_MAX_LATENCY_MS", "max_latency_ms")? {
            hardware.max_latency_ms = ms;
        }
        let simulate_only = matches!(
            lookup("ANTIPHASE_SIMULATE").as_deref().map(str::trim),
            Some("1") | Some("true")
        );

        engine.validate()?;
        hardware.validate()?;
        Ok(Self {
            engine,
            hardware,
            simulate_only,
        })
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    field: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::new(field, format!("{}={:?} is not a number", key, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_without_overrides() {
        let settings = settings(&[]).unwrap();

        assert_eq!(settings.engine, EngineConfig::default());
        assert_eq!(settings.hardware, HardwareConfig::default());
        assert!(!settings.simulate_only);
    }

    #[test]
    fn overrides_are_applied() {
        let settings = settings(&[
            ("ANTIPHASE_GAIN", "5"),
            ("ANTIPHASE_BUFFER_MS", "10"),
            ("ANTIPHASE_MAX_LATENCY_MS", "40"),
            ("ANTIPHASE_SIMULATE", "1"),
        ])
        .unwrap();

        assert_eq!(settings.engine.default_gain.value(), 2.0);
        assert_eq!(settings.hardware.buffer_duration_ms, 10);
        assert_eq!(settings.hardware.max_latency_ms, 40);
        assert!(settings.simulate_only);
    }

    #[test]
    fn rejects_bad_values() {
        let err = settings(&[("ANTIPHASE_BUFFER_MS", "fast")]).unwrap_err();
        assert_eq!(err.field, "buffer_duration_ms");

        let err = settings(&[("ANTIPHASE_BUFFER_MS", "60")]).unwrap_err();
        assert_eq!(err.field, "max_latency_ms");
    }
}
