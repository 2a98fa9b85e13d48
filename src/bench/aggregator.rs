use std::sync::Arc;
use std::time::{Duration, Instant};

use hdrhistogram::Histogram;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::{BackendError, ControlError};

use super::progress::ProgressSink;

/// One finished operation, emitted by a worker.
pub(crate) struct Outcome {
    pub(crate) latency_us: u64,
    pub(crate) error: Option<BackendError>,
}

/// The latency summary of one workload, final only after every worker has
/// hung up its outcome sender.
#[derive(Debug)]
pub struct BenchReport {
    pub total: u64,
    pub errors: u64,
    pub elapsed: Duration,
    pub min_us: u64,
    pub max_us: u64,
    pub mean_us: f64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub p999_us: u64,
    pub throughput: f64,
}

/// Drains the outcome stream into a histogram. Returns only once the stream
/// closes, so the report never misses a late outcome.
pub(crate) async fn aggregate(
    mut outcomes: mpsc::UnboundedReceiver<Outcome>,
    total_requests: u64,
    progress: Arc<dyn ProgressSink>,
) -> Result<BenchReport, ControlError> {
    let mut histogram = Histogram::<u64>::new(3).map_err(|err| ControlError::Histogram {
        message: format!("create failed: {}", err),
    })?;
    let started = Instant::now();
    let mut completed = 0u64;
    let mut errors = 0u64;
    while let Some(outcome) = outcomes.recv().await {
        completed += 1;
        match outcome.error {
            Some(error) => {
                errors += 1;
                warn!(%error, "operation failed");
            }
            None => {
                histogram
                    .record(outcome.latency_us.max(1))
                    .map_err(|err| ControlError::Histogram {
                        message: format!("record failed: {}", err),
                    })?;
            }
        }
        progress.advance(completed, total_requests);
    }
    let elapsed = started.elapsed();
    let successes = histogram.len();
    let throughput = if elapsed.as_secs_f64() > 0.0 {
        completed as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };
    Ok(BenchReport {
        total: completed,
        errors,
        elapsed,
        min_us: if successes == 0 { 0 } else { histogram.min() },
        max_us: histogram.max(),
        mean_us: histogram.mean(),
        p50_us: histogram.value_at_quantile(0.5),
        p95_us: histogram.value_at_quantile(0.95),
        p99_us: histogram.value_at_quantile(0.99),
        p999_us: histogram.value_at_quantile(0.999),
        throughput,
    })
}
