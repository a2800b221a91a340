pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod storage;

pub use config::SmartParkConfig;
pub use domain::{FeeCalculator, ParkingLedger, ParkingOperations};
pub use error::{LedgerError, Result};
