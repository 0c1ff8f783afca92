//! Chat completion infrastructure: HTTP adapter for the completion port.

pub mod client;
pub mod error;

pub use client::OpenAiCompletionClient;
pub use error::CompletionApiError;
