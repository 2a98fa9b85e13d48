//! Backend connectors for the supported key-value stores.
//!
//! Each backend implements the [`Connector`] capability interface once, and
//! the benchmark engine never branches on the database kind in its hot path.
//! etcd v2, etcd v3 (gRPC gateway), and Consul speak HTTP; ZooKeeper speaks
//! its native framed wire protocol.
mod consul;
mod etcdv2;
mod etcdv3;
mod op;
mod zookeeper;

#[cfg(test)]
pub(crate) mod test_support;


use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::args::Database;
use crate::error::BackendError;

pub use op::{ConsulOp, Etcdv2Op, Etcdv3Op, Operation, ZkOp};

/// A capability interface over one database product.
///
/// A connector is selected once at run configuration time and owns the
/// database endpoints for the run.
#[async_trait]
pub trait Connector: Send + Sync {
    fn database(&self) -> Database;

    /// Builds the write operation payload for this backend.
    fn new_write_op(&self, key: &str, value: &[u8]) -> Operation;

    /// Builds a write that replaces an existing key. Identical to
    /// [`Connector::new_write_op`] for stores whose put is already an upsert.
    fn new_overwrite_op(&self, key: &str, value: &[u8]) -> Operation {
        self.new_write_op(key, value)
    }

    /// Builds the read operation payload for this backend. `local_read`
    /// requests a serializable (non-quorum) read where the backend
    /// distinguishes.
    fn new_read_op(&self, key: &str, local_read: bool) -> Operation;

    /// Establishes `pool_size` independent connections, assigning endpoints
    /// round-robin.
    ///
    /// # Errors
    ///
    /// Returns an error when the endpoint list is empty or a connection
    /// cannot be established.
    async fn dial(&self, pool_size: usize) -> Result<Vec<Box<dyn Connection>>, BackendError>;

    /// Counts the keys visible on every endpoint, for the final
    /// observed-versus-expected report.
    ///
    /// # Errors
    ///
    /// Returns an error when any endpoint cannot be queried.
    async fn count_keys(&self) -> Result<BTreeMap<String, u64>, BackendError>;

    fn supports_compaction(&self) -> bool {
        false
    }

    /// Runs one out-of-band compaction on a dedicated short-lived connection.
    ///
    /// # Errors
    ///
    /// Returns an error when the backend rejects the compaction request.
    async fn compact(&self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// One established backend connection, owned by exactly one worker.
#[async_trait]
pub trait Connection: Send {
    /// Executes one operation to completion.
    ///
    /// # Errors
    ///
    /// Returns an error when the operation payload does not match this
    /// backend or the backend reports a failure.
    async fn execute(&mut self, op: &Operation) -> Result<(), BackendError>;
}

/// Selects the connector implementation for the configured backend.
#[must_use]
pub fn connector_for(database: Database, endpoints: Vec<String>) -> Arc<dyn Connector> {
    match database {
        Database::Etcdv2 => Arc::new(etcdv2::Etcdv2Connector::new(endpoints)),
        Database::Etcdv3 => Arc::new(etcdv3::Etcdv3Connector::new(endpoints)),
        Database::Zookeeper => Arc::new(zookeeper::ZkConnector::new(endpoints)),
        Database::Consul => Arc::new(consul::ConsulConnector::new(endpoints)),
    }
}

fn round_robin(endpoints: &[String], pool_size: usize) -> Result<Vec<String>, BackendError> {
    if endpoints.is_empty() {
        return Err(BackendError::NoEndpoints);
    }
    Ok((0..pool_size)
        .map(|i| endpoints[i % endpoints.len()].clone())
        .collect())
}
