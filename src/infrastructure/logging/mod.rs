//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber with JSON or
//! pretty stdout output and optional daily-rotated file output.

pub mod logger;

pub use logger::Logger;
