use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::args::Database;
use crate::config::PEER_IP_DELIMITER;
use crate::error::ControlError;

const MAX_MESSAGE_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ControlOperation {
    Start,
    Restart,
    Stop,
}

impl std::fmt::Display for ControlOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlOperation::Start => f.write_str("start"),
            ControlOperation::Restart => f.write_str("restart"),
            ControlOperation::Stop => f.write_str("stop"),
        }
    }
}

/// One control message, broadcast identically to every agent except for the
/// per-node `server_index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub operation: ControlOperation,
    pub database: Database,

    /// Peer IPs joined with [`PEER_IP_DELIMITER`].
    pub peer_ip_string: String,

    /// This node's ordinal in the peer list, unique across the broadcast.
    pub server_index: u32,

    /// ZooKeeper myid for this node, `server_index + 1`.
    pub zookeeper_myid: u32,

    #[serde(default)]
    pub etcd_compression: Option<String>,
    pub zookeeper_max_client_cnxns: u64,
    pub zookeeper_snap_count: u64,

    pub test_name: String,

    pub storage_project: String,
    pub storage_bucket: String,
    pub storage_subdirectory: String,
    /// Full contents of the credential key file, inlined as a string.
    pub storage_key: String,
    #[serde(default)]
    pub storage_endpoint: Option<String>,
}

impl TransferRequest {
    #[must_use]
    pub fn peer_ips(&self) -> Vec<String> {
        self.peer_ip_string
            .split(PEER_IP_DELIMITER)
            .filter(|part| !part.is_empty())
            .map(str::to_owned)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    Transfer(Box<TransferRequest>),
    Response(TransferResponse),
}

/// Reads one newline-delimited JSON message.
///
/// # Errors
///
/// Returns an error when the connection closes, the line exceeds the size
/// guard, or the payload is not a valid message.
pub async fn read_message(
    reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>,
) -> Result<WireMessage, ControlError> {
    let mut buffer: Vec<u8> = Vec::with_capacity(1024);
    let bytes = reader
        .read_until(b'\n', &mut buffer)
        .await
        .map_err(|err| ControlError::Io {
            context: "read message",
            source: err,
        })?;
    if bytes == 0 {
        return Err(ControlError::ConnectionClosed);
    }
    if buffer.len() > MAX_MESSAGE_BYTES {
        return Err(ControlError::WireMessageTooLarge {
            max_bytes: MAX_MESSAGE_BYTES,
        });
    }
    if buffer.ends_with(b"\n") {
        buffer.pop();
        if buffer.ends_with(b"\r") {
            buffer.pop();
        }
    }
    let line = std::str::from_utf8(&buffer)
        .map_err(|err| ControlError::WireMessageInvalidUtf8 { source: err })?;
    serde_json::from_str::<WireMessage>(line).map_err(|err| ControlError::Deserialize {
        context: "decode message",
        source: err,
    })
}

/// Writes one message as a single JSON line.
///
/// # Errors
///
/// Returns an error when encoding or the socket write fails.
pub async fn send_message(
    writer: &mut tokio::net::tcp::OwnedWriteHalf,
    message: &WireMessage,
) -> Result<(), ControlError> {
    let mut payload =
        serde_json::to_string(message).map_err(|err| ControlError::Serialize {
            context: "encode message",
            source: err,
        })?;
    payload.push('\n');
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|err| ControlError::Io {
            context: "send message",
            source: err,
        })
}
