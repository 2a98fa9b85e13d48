use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

/// Receives workload completion updates. The aggregator calls this once per
/// finished operation.
pub(crate) trait ProgressSink: Send + Sync {
    fn advance(&self, completed: u64, total: u64);
}

/// Logs a line at every 10% boundary.
#[derive(Default)]
pub(crate) struct LogProgress {
    last_decile: AtomicU64,
}

impl ProgressSink for LogProgress {
    fn advance(&self, completed: u64, total: u64) {
        if total == 0 {
            return;
        }
        let decile = completed.saturating_mul(10) / total;
        let previous = self.last_decile.swap(decile, Ordering::Relaxed);
        if decile > previous {
            info!(completed, total, percent = decile * 10, "workload progress");
        }
    }
}

pub(crate) struct NullProgress;

impl ProgressSink for NullProgress {
    fn advance(&self, _completed: u64, _total: u64) {}
}
