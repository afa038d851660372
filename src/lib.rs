pub mod config;
pub mod data_models;
pub mod driver;
pub mod error;
pub mod scenarios;

pub use config::Config;
pub use data_models::{HeaderSet, Latency, Param, Payload, SearchResponse};
pub use driver::{ApiResponse, RequestDriver};
pub use error::{ConfigError, DriverError};
