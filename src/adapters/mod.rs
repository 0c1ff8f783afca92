//! Concrete adapters behind the domain ports.

pub mod abilities;
pub mod sqlite;
