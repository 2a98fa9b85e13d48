//! Controller run configuration: TOML parsing and validation.
mod loader;
mod types;

#[cfg(test)]
mod tests;

pub use loader::load_run_config;
pub use types::{RunConfig, WorkloadConfig};

/// Delimiter used to join peer IPs into a single wire string. Must never
/// occur inside an IP address or hostname.
pub const PEER_IP_DELIMITER: &str = "___";
