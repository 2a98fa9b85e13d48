use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::args::Database;
use crate::error::BackendError;

use super::{Connection, Connector, Etcdv2Op, Operation, round_robin};

pub(super) struct Etcdv2Connector {
    endpoints: Vec<String>,
}

impl Etcdv2Connector {
    pub(super) fn new(endpoints: Vec<String>) -> Self {
        Self { endpoints }
    }
}

#[async_trait]
impl Connector for Etcdv2Connector {
    fn database(&self) -> Database {
        Database::Etcdv2
    }

    fn new_write_op(&self, key: &str, value: &[u8]) -> Operation {
        Operation::Etcdv2(Etcdv2Op {
            key: key.to_owned(),
            value: Some(String::from_utf8_lossy(value).into_owned()),
        })
    }

    fn new_read_op(&self, key: &str, _local_read: bool) -> Operation {
        // v2 reads are serializable unless quorum is requested, so the
        // local-read hint is already the default.
        Operation::Etcdv2(Etcdv2Op {
            key: key.to_owned(),
            value: None,
        })
    }

    async fn dial(&self, pool_size: usize) -> Result<Vec<Box<dyn Connection>>, BackendError> {
        let mut conns: Vec<Box<dyn Connection>> = Vec::with_capacity(pool_size);
        for endpoint in round_robin(&self.endpoints, pool_size)? {
            conns.push(Box::new(Etcdv2Connection {
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
            let url = format!("http://{}/v2/keys/?recursive=true", endpoint);
            let response = client.get(&url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(BackendError::UnexpectedStatus {
                    database: Database::Etcdv2,
                    status: status.as_u16(),
                    body: response.text().await.unwrap_or_default(),
                });
            }
            let body: serde_json::Value = response.json().await?;
            let count = body
                .get("node")
                .map(count_leaf_nodes)
                .unwrap_or(0);
            counts.insert(endpoint.clone(), count);
        }
        Ok(counts)
    }
}

fn count_leaf_nodes(node: &serde_json::Value) -> u64 {
    let is_dir = node.get("dir").and_then(serde_json::Value::as_bool) == Some(true);
    match node.get("nodes").and_then(serde_json::Value::as_array) {
        Some(children) => children.iter().map(count_leaf_nodes).sum(),
        None => {
            if is_dir {
                0
            } else {
                1
            }
        }
    }
}

struct Etcdv2Connection {
    client: reqwest::Client,
    base: String,
}

#[async_trait]
impl Connection for Etcdv2Connection {
    async fn execute(&mut self, op: &Operation) -> Result<(), BackendError> {
        let op = match op {
            Operation::Etcdv2(op) => op,
            other => {
                return Err(BackendError::PayloadMismatch {
                    database: Database::Etcdv2,
                    payload: other.payload_name(),
                });
            }
        };
        let url = format!("{}/v2/keys/{}", self.base, op.key);
        let response = match &op.value {
            Some(value) => {
                self.client
                    .put(&url)
                    .form(&[("value", value.as_str())])
                    .send()
                    .await?
            }
            None => self.client.get(&url).send().await?,
        };
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::UnexpectedStatus {
                database: Database::Etcdv2,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}
