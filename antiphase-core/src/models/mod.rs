pub mod config;
pub mod endpoint;
pub mod error;
pub mod gain;
pub mod state;
pub mod telemetry;
