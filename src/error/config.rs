use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Unsupported database {value:?}")]
    UnsupportedDatabase { value: String },
    #[error("Unsupported bench type {value:?}")]
    UnsupportedBenchType { value: String },
    #[error("Peer IP list must not be empty")]
    EmptyPeerList,
    #[error("total_requests must be >= 1")]
    ZeroTotalRequests,
    #[error("clients must be >= 1")]
    ZeroClients,
    #[error("connections must be >= 1")]
    ZeroConnections,
    #[error("key_size must be >= 1")]
    ZeroKeySize,
    #[error("value_size must be >= 1 when no value corpus path is given")]
    ZeroValueSize,
    #[error("Failed to read storage key {path}: {source}")]
    ReadStorageKey {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read value corpus {path}: {source}")]
    ReadValueCorpus {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Value corpus directory {path} contains no files")]
    EmptyValueCorpus { path: PathBuf },
}
