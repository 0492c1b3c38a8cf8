//! leadrelay
//!
//! Lead capture backend: a browser form posts name and contact data, the
//! service validates it, optionally enriches it with client IP, device class
//! and geolocation, and relays it to a Telegram chat.

pub mod cli;
pub mod config;
pub mod enrich;
pub mod error;
pub mod lead;
pub mod logging;
pub mod relay;
pub mod server;
pub mod services;
pub mod utils;

#[cfg(test)]
mod tests;

pub use config::AppConfig;
pub use error::{LeadError, Result};

/// Crate version, reported by the health endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
