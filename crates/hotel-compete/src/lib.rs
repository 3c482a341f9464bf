pub mod analysis;
pub mod config;
pub mod datasets;
pub mod error;
pub mod routing;
pub mod session;
pub mod telemetry;
