//! Ambient helpers shared by SmartPark binaries and libraries.

pub mod error;
pub mod logging;

pub use error::ConfigurationError;
