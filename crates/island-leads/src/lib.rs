pub mod config;
pub mod edge;
pub mod error;
pub mod leads;
pub mod telemetry;
