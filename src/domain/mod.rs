//! Domain layer: core models and port contracts.

pub mod error;
pub mod models;
pub mod ports;

pub use error::ErrorInfo;
