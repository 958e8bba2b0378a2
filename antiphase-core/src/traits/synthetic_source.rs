/// Source of synthetic telemetry for the simulated backend.
///
/// Each call yields a value in `[0, 1]`. Swap in a fixed sequence to make
/// simulated level and spectrum readings deterministic.
pub trait SyntheticSource: Send {
    fn next_unit(&mut self) -> f32;
}
