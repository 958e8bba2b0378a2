pub mod backend_provider;
pub mod session_observer;
pub mod synthetic_source;
