pub mod messages;
pub mod surface;
