use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::args::BenchType;
use crate::backend::Connector;
use crate::config::WorkloadConfig;
use crate::error::{AppError, AppResult, ControlError};

use super::aggregator::{BenchReport, aggregate};
use super::generator::generate_operations;
use super::keys::same_key;
use super::progress::ProgressSink;
use super::values::ValueCorpus;
use super::worker::run_worker;

/// Write attempts made before a read workload starts, to guarantee the read
/// key exists.
pub(crate) const PRIME_ATTEMPTS: usize = 7;

/// Everything one workload phase needs, built fresh per phase so no channel
/// or histogram state leaks across phases.
pub struct RunContext {
    pub connector: Arc<dyn Connector>,
    pub workload: WorkloadConfig,
    pub(crate) progress: Arc<dyn ProgressSink>,
}

impl RunContext {
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, workload: WorkloadConfig) -> Self {
        Self {
            connector,
            workload,
            progress: Arc::new(super::progress::LogProgress::default()),
        }
    }
}

/// Runs one complete workload phase and returns its latency report.
///
/// # Errors
///
/// Returns an error when connections cannot be established, the value corpus
/// cannot be loaded, priming exhausts its attempts, or a compaction fails.
pub async fn run_workload(ctx: &RunContext) -> AppResult<BenchReport> {
    // Reads need the target key to exist, and same-key overwrites need the
    // node created up front (ZooKeeper set fails on a missing node).
    if ctx.workload.bench_type == BenchType::Read || ctx.workload.same_key {
        prime_target_key(ctx).await?;
    }

    let mut corpus = match &ctx.workload.value_test_data_path {
        Some(path) => ValueCorpus::from_dir(std::path::Path::new(path)).map_err(AppError::from)?,
        None => ValueCorpus::random(ctx.workload.value_size),
    };

    let connections = ctx.connector.dial(ctx.workload.connections).await?;
    info!(
        database = %ctx.connector.database(),
        bench_type = %ctx.workload.bench_type,
        total_requests = ctx.workload.total_requests,
        clients = ctx.workload.clients,
        connections = connections.len(),
        "starting workload"
    );

    let (op_tx, op_rx) = mpsc::channel(ctx.workload.clients);
    let op_rx = Arc::new(Mutex::new(op_rx));
    let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

    let aggregator = tokio::spawn(aggregate(
        outcome_rx,
        ctx.workload.total_requests,
        Arc::clone(&ctx.progress),
    ));

    let mut workers = JoinSet::new();
    for connection in connections {
        let queue = Arc::clone(&op_rx);
        let outcomes = outcome_tx.clone();
        workers.spawn(run_worker(connection, queue, outcomes));
    }
    drop(outcome_tx);

    let mut compactions = JoinSet::new();
    generate_operations(
        &ctx.connector,
        &ctx.workload,
        &mut corpus,
        op_tx,
        &mut compactions,
    )
    .await;

    // Queue sender is gone, so workers drain and exit. Only then does the
    // outcome stream close and the aggregator finalize.
    while let Some(joined) = workers.join_next().await {
        joined?;
    }
    let report = aggregator.await??;

    while let Some(joined) = compactions.join_next().await {
        joined??;
    }

    info!(
        total = report.total,
        errors = report.errors,
        elapsed_ms = report.elapsed.as_millis() as u64,
        throughput = format_args!("{:.1}", report.throughput),
        min_us = report.min_us,
        mean_us = format_args!("{:.1}", report.mean_us),
        p50_us = report.p50_us,
        p95_us = report.p95_us,
        p99_us = report.p99_us,
        p999_us = report.p999_us,
        max_us = report.max_us,
        "workload finished"
    );

    if ctx.workload.bench_type == BenchType::Write {
        report_key_counts(ctx).await;
    }
    Ok(report)
}

/// Best-effort observed-versus-expected key count per endpoint. Failures are
/// logged, never fatal, since the workload itself already finished.
async fn report_key_counts(ctx: &RunContext) {
    match ctx.connector.count_keys().await {
        Ok(counts) => {
            let expected = if ctx.workload.same_key {
                1
            } else {
                ctx.workload.total_requests
            };
            for (endpoint, observed) in counts {
                if observed == expected {
                    info!(%endpoint, observed, "key count matches");
                } else {
                    warn!(%endpoint, observed, expected, "key count mismatch");
                }
            }
        }
        Err(error) => warn!(%error, "key count failed"),
    }
}

/// Writes the one fixed key the workload will target, retrying a bounded
/// number of times on a freshly dialed connection each attempt. Exhaustion
/// aborts the whole run.
async fn prime_target_key(ctx: &RunContext) -> AppResult<()> {
    let key = same_key(ctx.workload.key_size);
    let value = vec![b'a'; ctx.workload.value_size.max(1)];
    let op = ctx.connector.new_write_op(&key, &value);
    for attempt in 1..=PRIME_ATTEMPTS {
        let result = async {
            let mut connections = ctx.connector.dial(1).await?;
            let Some(connection) = connections.first_mut() else {
                return Err(crate::error::BackendError::NoEndpoints);
            };
            connection.execute(&op).await
        }
        .await;
        match result {
            Ok(()) => {
                info!(key = %key, attempt, "priming write succeeded");
                return Ok(());
            }
            Err(error) => warn!(key = %key, attempt, %error, "priming write failed"),
        }
    }
    Err(AppError::control(ControlError::PrimingExhausted {
        key,
        attempts: PRIME_ATTEMPTS,
    }))
}
