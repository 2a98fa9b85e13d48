use serde::Deserialize;

use crate::args::{BenchType, Database};

use super::PEER_IP_DELIMITER;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StepFlag {
    #[serde(default)]
    pub skip: bool,
}

/// The workload shape of the benchmark step.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkloadConfig {
    #[serde(default)]
    pub skip: bool,

    pub bench_type: BenchType,

    /// Width of every generated key, in bytes.
    pub key_size: usize,

    /// Size of the synthetic random value. Ignored when a value corpus path
    /// is given.
    #[serde(default)]
    pub value_size: usize,

    /// Directory whose files are read fully into memory and used round-robin
    /// as write values.
    #[serde(default)]
    pub value_test_data_path: Option<String>,

    /// Write the same key for every operation instead of sequential keys.
    #[serde(default)]
    pub same_key: bool,

    pub total_requests: u64,

    /// Capacity of the operation queue: how far the generator may run ahead
    /// of the workers. Independent of the worker count, which follows
    /// `connections`.
    pub clients: usize,

    /// Number of backend connections to dial. The worker pool is sized to
    /// match, one worker per connection.
    pub connections: usize,

    /// Fixed pacing delay between generated operations, in milliseconds.
    #[serde(default)]
    pub request_interval_ms: u64,

    /// Ask for serializable (local) reads where the backend distinguishes.
    #[serde(default)]
    pub local_read: bool,

    /// Every Nth write triggers an out-of-band etcd v3 compaction. Zero
    /// disables compaction.
    #[serde(default)]
    pub etcdv3_compaction_cycle: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Tuning {
    #[serde(default)]
    pub etcd_compression: Option<String>,

    #[serde(default = "default_zk_max_client_cnxns")]
    pub zookeeper_max_client_cnxns: u64,

    #[serde(default = "default_zk_snap_count")]
    pub zookeeper_snap_count: u64,
}

fn default_zk_max_client_cnxns() -> u64 {
    60
}

fn default_zk_snap_count() -> u64 {
    100_000
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub subdirectory: String,
    /// Path to the credential key file whose contents are inlined into every
    /// control message.
    #[serde(default)]
    pub key_path: Option<String>,
    /// Storage endpoint override, mainly for tests.
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// One whole benchmark run, immutable once validated.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub database: Database,
    pub test_name: String,
    pub peer_ips: Vec<String>,
    pub agent_port: u16,
    pub database_port: u16,

    #[serde(default)]
    pub step1: StepFlag,
    pub step2: WorkloadConfig,
    #[serde(default)]
    pub step3: StepFlag,

    #[serde(default)]
    pub tuning: Tuning,
    #[serde(default)]
    pub storage: StorageConfig,

    /// Full contents of the credential key file, loaded at startup.
    #[serde(skip)]
    pub storage_key: String,
}

impl RunConfig {
    #[must_use]
    pub fn agent_endpoints(&self) -> Vec<String> {
        self.peer_ips
            .iter()
            .map(|ip| format!("{}:{}", ip, self.agent_port))
            .collect()
    }

    #[must_use]
    pub fn database_endpoints(&self) -> Vec<String> {
        self.peer_ips
            .iter()
            .map(|ip| format!("{}:{}", ip, self.database_port))
            .collect()
    }

    #[must_use]
    pub fn peer_ip_string(&self) -> String {
        self.peer_ips.join(PEER_IP_DELIMITER)
    }
}
