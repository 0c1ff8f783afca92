//! Infrastructure layer: configuration, logging, and the completion API
//! client.

pub mod completion;
pub mod config;
pub mod logging;
