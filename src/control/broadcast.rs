use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::ControlError;
use crate::protocol::{
    ControlOperation, TransferRequest, WireMessage, read_message, send_message,
};

/// Pacing and deadline for one broadcast, shortened in tests.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BroadcastSettings {
    /// Delay between successive call initiations.
    pub(crate) stagger: Duration,
    /// Deadline for each individual call.
    pub(crate) timeout: Duration,
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            stagger: Duration::from_secs(1),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Sends `operation` to every agent, staggering initiations but awaiting
/// every response before returning. The first failure is reported after all
/// calls finish; completed agents are not rolled back.
pub(crate) async fn broadcast(
    operation: ControlOperation,
    base: &TransferRequest,
    endpoints: &[String],
    settings: BroadcastSettings,
) -> Result<(), ControlError> {
    let mut calls = JoinSet::new();
    for (index, endpoint) in endpoints.iter().enumerate() {
        let mut request = base.clone();
        request.operation = operation;
        request.server_index = index as u32;
        request.zookeeper_myid = index as u32 + 1;
        let addr = endpoint.clone();
        let delay = settings.stagger * index as u32;
        let timeout = settings.timeout;
        calls.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            transfer(&addr, request, timeout).await
        });
    }

    let mut first_error = None;
    while let Some(joined) = calls.join_next().await {
        let result = joined.map_err(|err| ControlError::Io {
            context: "join broadcast call",
            source: std::io::Error::other(err),
        })?;
        match result {
            Ok(addr) => info!(%addr, %operation, "agent acknowledged"),
            Err(error) => {
                warn!(%error, %operation, "agent call failed");
                first_error.get_or_insert(error);
            }
        }
    }
    match first_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// One controller-to-agent call: connect, send the request, read the single
/// response, all under one deadline.
async fn transfer(
    addr: &str,
    request: TransferRequest,
    timeout: Duration,
) -> Result<String, ControlError> {
    let operation = request.operation;
    let call = async {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ControlError::Connection {
                addr: addr.to_owned(),
                source,
            })?;
        let (read_half, mut write_half) = stream.into_split();
        send_message(&mut write_half, &WireMessage::Transfer(Box::new(request))).await?;
        let mut reader = BufReader::new(read_half);
        match read_message(&mut reader).await? {
            WireMessage::Response(response) => {
                if response.success {
                    Ok(addr.to_owned())
                } else {
                    Err(ControlError::TransferRejected {
                        addr: addr.to_owned(),
                        operation: operation.to_string(),
                        message: response.error.unwrap_or_default(),
                    })
                }
            }
            WireMessage::Transfer(_) => Err(ControlError::UnexpectedMessage {
                addr: addr.to_owned(),
            }),
        }
    };
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_err| ControlError::TransferTimeout {
            addr: addr.to_owned(),
            timeout_ms: timeout.as_millis() as u64,
        })?
}
