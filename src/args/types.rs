use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ConfigError};

/// The closed set of supported database backends.
#[derive(Debug, Clone, Copy, ValueEnum, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Etcdv2,
    Etcdv3,
    #[serde(alias = "zk")]
    Zookeeper,
    Consul,
}

impl Database {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Database::Etcdv2 => "etcdv2",
            Database::Etcdv3 => "etcdv3",
            Database::Zookeeper => "zookeeper",
            Database::Consul => "consul",
        }
    }
}

impl std::fmt::Display for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Database {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "etcdv2" => Ok(Database::Etcdv2),
            "etcdv3" => Ok(Database::Etcdv3),
            "zk" | "zookeeper" => Ok(Database::Zookeeper),
            "consul" => Ok(Database::Consul),
            _ => Err(AppError::config(ConfigError::UnsupportedDatabase {
                value: s.to_owned(),
            })),
        }
    }
}

/// Which workload a benchmark phase runs.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BenchType {
    Write,
    Read,
}

impl std::fmt::Display for BenchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BenchType::Write => f.write_str("write"),
            BenchType::Read => f.write_str("read"),
        }
    }
}

impl std::str::FromStr for BenchType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "write" => Ok(BenchType::Write),
            "read" => Ok(BenchType::Read),
            _ => Err(AppError::config(ConfigError::UnsupportedBenchType {
                value: s.to_owned(),
            })),
        }
    }
}
