use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::json;

use crate::args::Database;
use crate::error::BackendError;

use super::{Connection, Connector, Etcdv3Op, Operation, round_robin};

/// Talks to etcd v3 through its gRPC gateway, which transcodes JSON bodies
/// with base64-encoded byte fields.
pub(super) struct Etcdv3Connector {
    endpoints: Vec<String>,
}

impl Etcdv3Connector {
    pub(super) fn new(endpoints: Vec<String>) -> Self {
        Self { endpoints }
    }

    fn first_endpoint(&self) -> Result<&str, BackendError> {
        self.endpoints
            .first()
            .map(String::as_str)
            .ok_or(BackendError::NoEndpoints)
    }
}

#[async_trait]
impl Connector for Etcdv3Connector {
    fn database(&self) -> Database {
        Database::Etcdv3
    }

    fn new_write_op(&self, key: &str, value: &[u8]) -> Operation {
        Operation::Etcdv3(Etcdv3Op {
            key: key.to_owned(),
            value: Some(value.to_vec()),
            serializable: false,
        })
    }

    fn new_read_op(&self, key: &str, local_read: bool) -> Operation {
        Operation::Etcdv3(Etcdv3Op {
            key: key.to_owned(),
            value: None,
            serializable: local_read,
        })
    }

    async fn dial(&self, pool_size: usize) -> Result<Vec<Box<dyn Connection>>, BackendError> {
        let mut conns: Vec<Box<dyn Connection>> = Vec::with_capacity(pool_size);
        for endpoint in round_robin(&self.endpoints, pool_size)? {
            conns.push(Box::new(Etcdv3Connection {
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
            // A range from \x00 over every key, count only.
            let body = json!({
                "key": BASE64.encode([0u8]),
                "range_end": BASE64.encode([0u8]),
                "count_only": true,
            });
            let url = format!("http://{}/v3/kv/range", endpoint);
            let response = client.post(&url).json(&body).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(BackendError::UnexpectedStatus {
                    database: Database::Etcdv3,
                    status: status.as_u16(),
                    body: response.text().await.unwrap_or_default(),
                });
            }
            let reply: serde_json::Value = response.json().await?;
            let count = match reply.get("count") {
                Some(serde_json::Value::String(s)) => s.parse::<u64>().map_err(|_err| {
                    BackendError::UnexpectedResponse {
                        database: Database::Etcdv3,
                        detail: format!("non-numeric count {:?}", s),
                    }
                })?,
                Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or(0),
                _ => 0,
            };
            counts.insert(endpoint.clone(), count);
        }
        Ok(counts)
    }

    fn supports_compaction(&self) -> bool {
        true
    }

    async fn compact(&self) -> Result<(), BackendError> {
        let endpoint = self.first_endpoint()?;
        let client = reqwest::Client::new();

        // Fetch the current revision from a cheap single-key range.
        let url = format!("http://{}/v3/kv/range", endpoint);
        let probe = json!({ "key": BASE64.encode([0u8]), "count_only": true });
        let response = client.post(&url).json(&probe).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::UnexpectedStatus {
                database: Database::Etcdv3,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let reply: serde_json::Value = response.json().await?;
        let revision = reply
            .get("header")
            .and_then(|h| h.get("revision"))
            .and_then(|r| match r {
                serde_json::Value::String(s) => s.parse::<i64>().ok(),
                serde_json::Value::Number(n) => n.as_i64(),
                _ => None,
            })
            .ok_or_else(|| BackendError::UnexpectedResponse {
                database: Database::Etcdv3,
                detail: "range reply carried no header.revision".to_owned(),
            })?;

        let url = format!("http://{}/v3/kv/compaction", endpoint);
        let body = json!({ "revision": revision, "physical": true });
        let response = client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::UnexpectedStatus {
                database: Database::Etcdv3,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}

struct Etcdv3Connection {
    client: reqwest::Client,
    base: String,
}

#[async_trait]
impl Connection for Etcdv3Connection {
    async fn execute(&mut self, op: &Operation) -> Result<(), BackendError> {
        let op = match op {
            Operation::Etcdv3(op) => op,
            other => {
                return Err(BackendError::PayloadMismatch {
                    database: Database::Etcdv3,
                    payload: other.payload_name(),
                });
            }
        };
        let (url, body) = match &op.value {
            Some(value) => (
                format!("{}/v3/kv/put", self.base),
                json!({
                    "key": BASE64.encode(op.key.as_bytes()),
                    "value": BASE64.encode(value),
                }),
            ),
            None => (
                format!("{}/v3/kv/range", self.base),
                json!({
                    "key": BASE64.encode(op.key.as_bytes()),
                    "serializable": op.serializable,
                }),
            ),
        };
        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::UnexpectedStatus {
                database: Database::Etcdv3,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }
}
