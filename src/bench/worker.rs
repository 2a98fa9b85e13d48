use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, mpsc};

use crate::backend::{Connection, Operation};

use super::aggregator::Outcome;

/// Pulls operations off the shared queue until it closes, executing each on
/// this worker's private connection and reporting exactly one outcome per
/// operation, success or not.
pub(crate) async fn run_worker(
    mut connection: Box<dyn Connection>,
    queue: Arc<Mutex<mpsc::Receiver<Operation>>>,
    outcomes: mpsc::UnboundedSender<Outcome>,
) {
    loop {
        // Hold the lock only while dequeuing, never across the execute.
        let op = { queue.lock().await.recv().await };
        let Some(op) = op else {
            break;
        };
        let started = Instant::now();
        let result = connection.execute(&op).await;
        let outcome = Outcome {
            latency_us: u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
            error: result.err(),
        };
        if outcomes.send(outcome).is_err() {
            break;
        }
    }
}
