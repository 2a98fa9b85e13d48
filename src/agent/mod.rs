//! The agent side: a small control endpoint that launches, restarts, and
//! stops one database process per node, monitors it, and ships artifacts to
//! remote storage after the run.

mod layout;
mod monitor;
mod supervisor;
mod uploader;


use std::path::PathBuf;

use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::error::{AgentError, AppResult};
use crate::protocol::{TransferResponse, WireMessage, read_message, send_message};

use self::layout::AgentLayout;
use self::supervisor::{SupervisorHandle, spawn_supervisor};

pub use self::supervisor::BinaryPaths;

#[derive(Debug, Clone)]
pub struct AgentOptions {
    pub port: u16,
    pub working_directory: PathBuf,
    pub binaries: BinaryPaths,
}

/// Runs the agent until interrupted.
///
/// # Errors
///
/// Returns an error when the working directory does not exist or the control
/// port cannot be bound.
pub async fn run_agent(options: AgentOptions) -> AppResult<()> {
    let root = &options.working_directory;
    let is_dir = tokio::fs::metadata(root)
        .await
        .map(|meta| meta.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(AgentError::MissingWorkingDirectory {
            path: root.clone(),
        }
        .into());
    }
    let layout = AgentLayout::new(root);
    let handle = spawn_supervisor(layout, options.binaries.clone());
    let listener = TcpListener::bind(("0.0.0.0", options.port)).await?;
    info!(port = options.port, root = %root.display(), "agent listening");
    serve(listener, handle).await
}

async fn serve(listener: TcpListener, handle: SupervisorHandle) -> AppResult<()> {
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        info!(%peer, "controller connected");
                        tokio::spawn(serve_connection(stream, handle.clone()));
                    }
                    Err(error) => warn!(%error, "accept failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received; shutting down agent");
                return Ok(());
            }
        }
    }
}

/// One control call: a single request, a single response, then hang up.
async fn serve_connection(stream: TcpStream, handle: SupervisorHandle) {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let request = match read_message(&mut reader).await {
        Ok(WireMessage::Transfer(request)) => request,
        Ok(WireMessage::Response(_)) => {
            warn!("controller sent a response message; dropping connection");
            return;
        }
        Err(error) => {
            warn!(%error, "failed to read control request");
            return;
        }
    };
    let result = handle.transfer(*request).await;
    let response = TransferResponse {
        success: result.is_ok(),
        error: result.err().map(|error| error.to_string()),
    };
    if let Err(error) = send_message(&mut write_half, &WireMessage::Response(response)).await {
        warn!(%error, "failed to send control response");
    }
}
