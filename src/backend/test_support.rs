//! A scripted in-memory connector for engine tests.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Semaphore};

use crate::args::Database;
use crate::error::BackendError;

use super::{Connection, Connector, ConsulOp, Operation};

/// Records every executed key and optionally fails the first N executions
/// across all connections.
pub(crate) struct MockConnector {
    pub(crate) executed: Arc<AtomicU64>,
    pub(crate) compactions: Arc<AtomicU64>,
    /// Operations built by the generator, whether or not executed yet.
    pub(crate) ops_built: Arc<AtomicU64>,
    fail_first: Arc<AtomicU64>,
    keys: Arc<Mutex<Vec<String>>>,
    compaction_capable: bool,
    gate: Option<Arc<Semaphore>>,
}

impl MockConnector {
    pub(crate) fn new() -> Self {
        Self::failing_first(0)
    }

    pub(crate) fn failing_first(failures: u64) -> Self {
        Self {
            executed: Arc::new(AtomicU64::new(0)),
            compactions: Arc::new(AtomicU64::new(0)),
            ops_built: Arc::new(AtomicU64::new(0)),
            fail_first: Arc::new(AtomicU64::new(failures)),
            keys: Arc::new(Mutex::new(Vec::new())),
            compaction_capable: false,
            gate: None,
        }
    }

    /// Connections block in `execute` until a permit arrives on `gate`.
    pub(crate) fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    pub(crate) fn with_compaction(mut self) -> Self {
        self.compaction_capable = true;
        self
    }

    pub(crate) async fn executed_keys(&self) -> Vec<String> {
        self.keys.lock().await.clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn database(&self) -> Database {
        Database::Consul
    }

    fn new_write_op(&self, key: &str, value: &[u8]) -> Operation {
        self.ops_built.fetch_add(1, Ordering::SeqCst);
        Operation::Consul(ConsulOp {
            key: key.to_owned(),
            value: Some(value.to_vec()),
        })
    }

    fn new_read_op(&self, key: &str, _local_read: bool) -> Operation {
        self.ops_built.fetch_add(1, Ordering::SeqCst);
        Operation::Consul(ConsulOp {
            key: key.to_owned(),
            value: None,
        })
    }

    async fn dial(&self, pool_size: usize) -> Result<Vec<Box<dyn Connection>>, BackendError> {
        let mut conns: Vec<Box<dyn Connection>> = Vec::with_capacity(pool_size);
        for _ in 0..pool_size {
            conns.push(Box::new(MockConnection {
                executed: Arc::clone(&self.executed),
                fail_first: Arc::clone(&self.fail_first),
                keys: Arc::clone(&self.keys),
                gate: self.gate.clone(),
            }));
        }
        Ok(conns)
    }

    async fn count_keys(&self) -> Result<BTreeMap<String, u64>, BackendError> {
        let mut counts = BTreeMap::new();
        counts.insert("mock".to_owned(), self.executed.load(Ordering::SeqCst));
        Ok(counts)
    }

    fn supports_compaction(&self) -> bool {
        self.compaction_capable
    }

    async fn compact(&self) -> Result<(), BackendError> {
        self.compactions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockConnection {
    executed: Arc<AtomicU64>,
    fail_first: Arc<AtomicU64>,
    keys: Arc<Mutex<Vec<String>>>,
    gate: Option<Arc<Semaphore>>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(&mut self, op: &Operation) -> Result<(), BackendError> {
        if let Some(gate) = &self.gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_err) => return Err(BackendError::Injected),
            }
        }
        let remaining = self.fail_first.load(Ordering::SeqCst);
        if remaining > 0
            && self
                .fail_first
                .compare_exchange(remaining, remaining - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            return Err(BackendError::Injected);
        }
        let key = match op {
            Operation::Consul(op) => op.key.clone(),
            other => {
                return Err(BackendError::PayloadMismatch {
                    database: Database::Consul,
                    payload: other.payload_name(),
                });
            }
        };
        self.executed.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().await.push(key);
        Ok(())
    }
}
