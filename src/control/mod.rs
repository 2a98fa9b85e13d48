//! The controller side: broadcasts lifecycle operations to every agent and
//! drives the benchmark workload between them.

mod broadcast;
mod run;

#[cfg(test)]
mod tests;

pub use run::run_control;
