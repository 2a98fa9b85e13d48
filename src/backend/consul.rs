use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::args::Database;
use crate::error::BackendError;

use super::{Connection, Connector, ConsulOp, Operation, round_robin};

pub(super) struct ConsulConnector {
    endpoints: Vec<String>,
}

impl ConsulConnector {
    pub(super) fn new(endpoints: Vec<String>) -> Self {
        Self { endpoints }
    }
}

#[async_trait]
impl Connector for ConsulConnector {
    fn database(&self) -> Database {
        Database::Consul
    }

    fn new_write_op(&self, key: &str, value: &[u8]) -> Operation {
        Operation::Consul(ConsulOp {
            key: key.to_owned(),
            value: Some(value.to_vec()),
        })
    }

    fn new_read_op(&self, key: &str, _local_read: bool) -> Operation {
        Operation::Consul(ConsulOp {
            key: key.to_owned(),
            value: None,
        })
    }

    async fn dial(&self, pool_size: usize) -> Result<Vec<Box<dyn Connection>>, BackendError> {
        let mut conns: Vec<Box<dyn Connection>> = Vec::with_capacity(pool_size);
        for endpoint in round_robin(&self.endpoints, pool_size)? {
            conns.push(Box::new(ConsulConnection {
                client: reqwest::Client::new(),
                base: format!("http://{}", endpoint),
            }));
        }
        Ok(conns)
    }

    async fn count_keys(&self) -> Result<BTreeMap<String, u64>, BackendError> {
        let client = reqwest::Client::new();
        let mut counts = BTreeMap::new();
        for endpoint in &self.endpoints {
            let url = format!("http://{}/v1/kv/?keys", endpoint);
            let response = client.get(&url).send().await?;
            let status = response.status();
            // An empty store answers 404 rather than an empty array.
            if status.as_u16() == 404 {
                counts.insert(endpoint.clone(), 0);
                continue;
            }
            if !status.is_success() {
                return Err(BackendError::UnexpectedStatus {
                    database: Database::Consul,
                    status: status.as_u16(),
                    body: response.text().await.unwrap_or_default(),
                });
            }
            let keys: Vec<String> = response.json().await?;
            counts.insert(endpoint.clone(), keys.len() as u64);
        }
        Ok(counts)
    }
}

struct ConsulConnection {
    client: reqwest::Client,
    base: String,
}

#[async_trait]
impl Connection for ConsulConnection {
    async fn execute(&mut self, op: &Operation) -> Result<(), BackendError> {
        let op = match op {
            Operation::Consul(op) => op,
            other => {
                return Err(BackendError::PayloadMismatch {
                    database: Database::Consul,
                    payload: other.payload_name(),
                });
            }
        };
        let url = format!("{}/v1/kv/{}", self.base, op.key);
        let response = match &op.value {
            Some(value) => self.client.put(&url).body(value.clone()).send().await?,
            None => self.client.get(&url).send().await?,
        };
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::UnexpectedStatus {
                database: Database::Consul,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}
