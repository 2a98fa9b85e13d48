//! The benchmark engine: a bounded operation queue fed by one generator,
//! drained by a fixed worker pool, with every outcome funneled into a single
//! aggregator that owns the latency histogram.

mod aggregator;
mod driver;
mod generator;
mod keys;
mod progress;
mod values;
mod worker;

#[cfg(test)]
mod tests;

pub use driver::{RunContext, run_workload};
