pub mod buffers;
pub mod channel_format;
pub mod level_meter;
pub mod phase_inverter;
pub mod spectrum;
