//! ZooKeeper backend over the native framed client protocol.

mod wire;

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::args::Database;
use crate::error::BackendError;

use self::wire::{FrameReader, FrameWriter, OP_CREATE, OP_GET_CHILDREN, OP_GET_DATA, OP_SET_DATA};
use super::{Connection, Connector, Operation, ZkOp, round_robin};

const SESSION_TIMEOUT_MS: i32 = 10_000;
/// `/zookeeper` is the server's own quota subtree, not user data.
const SYSTEM_NODE: &str = "zookeeper";

pub(super) struct ZkConnector {
    endpoints: Vec<String>,
}

impl ZkConnector {
    pub(super) fn new(endpoints: Vec<String>) -> Self {
        Self { endpoints }
    }
}

#[async_trait]
impl Connector for ZkConnector {
    fn database(&self) -> Database {
        Database::Zookeeper
    }

    fn new_write_op(&self, key: &str, value: &[u8]) -> Operation {
        Operation::Zookeeper(ZkOp {
            path: format!("/{}", key),
            data: Some(value.to_vec()),
            overwrite: false,
        })
    }

    fn new_overwrite_op(&self, key: &str, value: &[u8]) -> Operation {
        Operation::Zookeeper(ZkOp {
            path: format!("/{}", key),
            data: Some(value.to_vec()),
            overwrite: true,
        })
    }

    fn new_read_op(&self, key: &str, _local_read: bool) -> Operation {
        // Every ZooKeeper read is served by the connected member.
        Operation::Zookeeper(ZkOp {
            path: format!("/{}", key),
            data: None,
            overwrite: false,
        })
    }

    async fn dial(&self, pool_size: usize) -> Result<Vec<Box<dyn Connection>>, BackendError> {
        let mut conns: Vec<Box<dyn Connection>> = Vec::with_capacity(pool_size);
        for endpoint in round_robin(&self.endpoints, pool_size)? {
            conns.push(Box::new(ZkConnection::connect(&endpoint).await?));
        }
        Ok(conns)
    }

    async fn count_keys(&self) -> Result<BTreeMap<String, u64>, BackendError> {
        let mut counts = BTreeMap::new();
        for endpoint in &self.endpoints {
            let mut conn = ZkConnection::connect(endpoint).await?;
            let children = conn.children_of_root().await?;
            let count = children.iter().filter(|c| *c != SYSTEM_NODE).count() as u64;
            counts.insert(endpoint.clone(), count);
        }
        Ok(counts)
    }
}

struct ZkConnection {
    stream: TcpStream,
    xid: i32,
}

impl ZkConnection {
    async fn connect(addr: &str) -> Result<Self, BackendError> {
        let mut stream =
            TcpStream::connect(addr)
                .await
                .map_err(|source| BackendError::ZkConnection {
                    addr: addr.to_owned(),
                    source,
                })?;

        let mut request = FrameWriter::new();
        request
            .put_i32(0) // protocol version
            .put_i64(0) // last zxid seen
            .put_i32(SESSION_TIMEOUT_MS)
            .put_i64(0) // session id, new session
            .put_buffer(&[0u8; 16]);
        stream
            .write_all(&request.frame())
            .await
            .map_err(|source| BackendError::ZkIo { source })?;

        let reply = read_frame(&mut stream).await?;
        let mut reader = FrameReader::new(&reply);
        let _protocol_version = reader.get_i32()?;
        let _negotiated_timeout = reader.get_i32()?;
        let session_id = reader.get_i64()?;
        if session_id == 0 {
            return Err(BackendError::ZkHandshake {
                addr: addr.to_owned(),
            });
        }
        Ok(Self { stream, xid: 0 })
    }

    fn next_xid(&mut self) -> i32 {
        self.xid += 1;
        self.xid
    }

    /// Sends one request frame and reads its reply, checking the error code
    /// in the reply header. Returns the reply body past the header.
    async fn round_trip(
        &mut self,
        opcode: i32,
        op_name: &'static str,
        build: impl FnOnce(&mut FrameWriter),
    ) -> Result<Vec<u8>, BackendError> {
        let xid = self.next_xid();
        let mut request = FrameWriter::new();
        request.put_i32(xid).put_i32(opcode);
        build(&mut request);
        self.stream
            .write_all(&request.frame())
            .await
            .map_err(|source| BackendError::ZkIo { source })?;

        let reply = read_frame(&mut self.stream).await?;
        let mut reader = FrameReader::new(&reply);
        let _reply_xid = reader.get_i32()?;
        let _zxid = reader.get_i64()?;
        let err = reader.get_i32()?;
        if err != 0 {
            return Err(BackendError::ZkCode { code: err, op: op_name });
        }
        Ok(reply[16..].to_vec())
    }

    async fn children_of_root(&mut self) -> Result<Vec<String>, BackendError> {
        let body = self
            .round_trip(OP_GET_CHILDREN, "getChildren", |w| {
                w.put_string("/").put_bool(false);
            })
            .await?;
        let mut reader = FrameReader::new(&body);
        let count = reader.get_i32()?;
        let mut children = Vec::with_capacity(count.max(0) as usize);
        for _ in 0..count {
            children.push(reader.get_string()?);
        }
        Ok(children)
    }
}

#[async_trait]
impl Connection for ZkConnection {
    async fn execute(&mut self, op: &Operation) -> Result<(), BackendError> {
        let op = match op {
            Operation::Zookeeper(op) => op,
            other => {
                return Err(BackendError::PayloadMismatch {
                    database: Database::Zookeeper,
                    payload: other.payload_name(),
                });
            }
        };
        match (&op.data, op.overwrite) {
            (Some(data), false) => {
                self.round_trip(OP_CREATE, "create", |w| {
                    w.put_string(&op.path).put_buffer(data).put_open_acl().put_i32(0);
                })
                .await?;
            }
            (Some(data), true) => {
                self.round_trip(OP_SET_DATA, "setData", |w| {
                    w.put_string(&op.path).put_buffer(data).put_i32(-1);
                })
                .await?;
            }
            (None, _) => {
                self.round_trip(OP_GET_DATA, "getData", |w| {
                    w.put_string(&op.path).put_bool(false);
                })
                .await?;
            }
        }
        Ok(())
    }
}

async fn read_frame(stream: &mut TcpStream) -> Result<Vec<u8>, BackendError> {
    let mut len = [0u8; 4];
    stream
        .read_exact(&mut len)
        .await
        .map_err(|source| BackendError::ZkIo { source })?;
    let len = i32::from_be_bytes(len);
    if len < 0 {
        return Err(BackendError::ZkIo {
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "negative ZooKeeper frame length",
            ),
        });
    }
    let mut payload = vec![0u8; len as usize];
    stream
        .read_exact(&mut payload)
        .await
        .map_err(|source| BackendError::ZkIo { source })?;
    Ok(payload)
}
