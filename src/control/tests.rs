use std::time::Duration;

use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::args::Database;
use crate::error::ControlError;
use crate::protocol::{
    ControlOperation, TransferRequest, TransferResponse, WireMessage, read_message, send_message,
};

use super::broadcast::{BroadcastSettings, broadcast};

fn base_request() -> TransferRequest {
    TransferRequest {
        operation: ControlOperation::Start,
        database: Database::Etcdv3,
        peer_ip_string: "10.0.0.1___10.0.0.2".to_owned(),
        server_index: 0,
        zookeeper_myid: 1,
        etcd_compression: None,
        zookeeper_max_client_cnxns: 60,
        zookeeper_snap_count: 100_000,
        test_name: "bench-001".to_owned(),
        storage_project: String::new(),
        storage_bucket: String::new(),
        storage_subdirectory: String::new(),
        storage_key: String::new(),
        storage_endpoint: None,
    }
}

fn fast_settings() -> BroadcastSettings {
    BroadcastSettings {
        stagger: Duration::ZERO,
        timeout: Duration::from_secs(5),
    }
}

/// One mock agent accepting a single call. Resolves to the server index it
/// was handed.
async fn spawn_agent(success: bool) -> Result<(String, JoinHandle<Result<u32, String>>), String> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| format!("Bind failed: {}", err))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("Local addr failed: {}", err))?
        .to_string();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener
            .accept()
            .await
            .map_err(|err| format!("Accept failed: {}", err))?;
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        let request = match read_message(&mut reader).await {
            Ok(WireMessage::Transfer(request)) => request,
            Ok(WireMessage::Response(_)) => return Err("Unexpected response".to_owned()),
            Err(err) => return Err(format!("Read failed: {}", err)),
        };
        let response = TransferResponse {
            success,
            error: if success {
                None
            } else {
                Some("disk full".to_owned())
            },
        };
        send_message(&mut write_half, &WireMessage::Response(response))
            .await
            .map_err(|err| format!("Send failed: {}", err))?;
        Ok(request.server_index)
    });
    Ok((addr, handle))
}

#[tokio::test(flavor = "current_thread")]
async fn broadcast_assigns_distinct_server_indices() -> Result<(), String> {
    let (addr_a, handle_a) = spawn_agent(true).await?;
    let (addr_b, handle_b) = spawn_agent(true).await?;
    broadcast(
        ControlOperation::Start,
        &base_request(),
        &[addr_a, addr_b],
        fast_settings(),
    )
    .await
    .map_err(|err| format!("Broadcast failed: {}", err))?;

    let index_a = handle_a
        .await
        .map_err(|err| format!("Join failed: {}", err))??;
    let index_b = handle_b
        .await
        .map_err(|err| format!("Join failed: {}", err))??;
    let mut indices = vec![index_a, index_b];
    indices.sort_unstable();
    if indices != vec![0, 1] {
        return Err(format!("Unexpected indices {:?}", indices));
    }
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn broadcast_reports_rejection_after_awaiting_all() -> Result<(), String> {
    let (addr_ok, handle_ok) = spawn_agent(true).await?;
    let (addr_bad, handle_bad) = spawn_agent(false).await?;
    let result = broadcast(
        ControlOperation::Stop,
        &base_request(),
        &[addr_ok, addr_bad],
        fast_settings(),
    )
    .await;
    match result {
        Err(ControlError::TransferRejected { message, .. }) if message == "disk full" => {}
        other => return Err(format!("Expected rejection, got {:?}", other.err())),
    }

    // Both agents were contacted even though one rejected.
    handle_ok
        .await
        .map_err(|err| format!("Join failed: {}", err))??;
    handle_bad
        .await
        .map_err(|err| format!("Join failed: {}", err))??;
    Ok(())
}

#[tokio::test(flavor = "current_thread")]
async fn broadcast_surfaces_connection_failures() -> Result<(), String> {
    // Bind then drop so the port is very likely closed.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|err| format!("Bind failed: {}", err))?;
        listener
            .local_addr()
            .map_err(|err| format!("Local addr failed: {}", err))?
            .to_string()
    };
    match broadcast(ControlOperation::Start, &base_request(), &[addr], fast_settings()).await {
        Err(ControlError::Connection { .. }) => Ok(()),
        other => Err(format!("Expected connection error, got {:?}", other.err())),
    }
}
