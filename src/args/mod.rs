//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
mod types;

#[cfg(test)]
mod tests;

pub use cli::{Command, KvstressArgs};
pub use types::{BenchType, Database};
