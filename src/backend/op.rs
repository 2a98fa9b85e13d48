/// A backend-agnostic operation envelope.
///
/// Exactly one payload variant is populated per operation, selected by the
/// active backend's connector. Executing a mismatched variant is a
/// [`crate::error::BackendError::PayloadMismatch`].
#[derive(Debug, Clone)]
pub enum Operation {
    Etcdv2(Etcdv2Op),
    Etcdv3(Etcdv3Op),
    Zookeeper(ZkOp),
    Consul(ConsulOp),
}

impl Operation {
    #[must_use]
    pub const fn payload_name(&self) -> &'static str {
        match self {
            Operation::Etcdv2(_) => "etcdv2",
            Operation::Etcdv3(_) => "etcdv3",
            Operation::Zookeeper(_) => "zookeeper",
            Operation::Consul(_) => "consul",
        }
    }
}

/// etcd v2 reads are serializable by default.
#[derive(Debug, Clone)]
pub struct Etcdv2Op {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Etcdv3Op {
    pub key: String,
    pub value: Option<Vec<u8>>,
    /// Ask for a serializable (member-local) read instead of a quorum read.
    pub serializable: bool,
}

/// ZooKeeper nodes live under `/`, so `path` carries the leading slash.
#[derive(Debug, Clone)]
pub struct ZkOp {
    pub path: String,
    pub data: Option<Vec<u8>>,
    /// `set` on an existing node instead of `create`.
    pub overwrite: bool,
}

#[derive(Debug, Clone)]
pub struct ConsulOp {
    pub key: String,
    pub value: Option<Vec<u8>>,
}
