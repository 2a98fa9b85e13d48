use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::args::BenchType;
use crate::backend::Connector;
use crate::config::WorkloadConfig;
use crate::error::BackendError;

use super::keys::{same_key, sequential_key};
use super::values::ValueCorpus;

/// Produces the whole operation stream into the bounded queue. Backpressure
/// from the queue is the only throttle besides the optional fixed pacing
/// interval.
pub(crate) async fn generate_operations(
    connector: &Arc<dyn Connector>,
    workload: &WorkloadConfig,
    corpus: &mut ValueCorpus,
    queue: mpsc::Sender<crate::backend::Operation>,
    compactions: &mut JoinSet<Result<(), BackendError>>,
) {
    let interval = Duration::from_millis(workload.request_interval_ms);
    // Every read targets the one key the priming write created.
    let read_key = same_key(workload.key_size);
    for index in 0..workload.total_requests {
        let op = match workload.bench_type {
            BenchType::Write => {
                let key = if workload.same_key {
                    same_key(workload.key_size)
                } else {
                    sequential_key(index, workload.key_size)
                };
                let value = corpus.next_value();
                if workload.same_key {
                    // The driver already created the node in the priming
                    // step, so every measured write is an overwrite.
                    connector.new_overwrite_op(&key, value)
                } else {
                    connector.new_write_op(&key, value)
                }
            }
            BenchType::Read => connector.new_read_op(&read_key, workload.local_read),
        };
        if queue.send(op).await.is_err() {
            // Every worker is gone. Nothing left to feed.
            return;
        }
        if workload.bench_type == BenchType::Write
            && workload.etcdv3_compaction_cycle > 0
            && (index + 1) % workload.etcdv3_compaction_cycle == 0
            && connector.supports_compaction()
        {
            let connector = Arc::clone(connector);
            compactions.spawn(async move { connector.compact().await });
        }
        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }
}
