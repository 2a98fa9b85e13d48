use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::AgentError;
use crate::protocol::{ControlOperation, TransferRequest};
use crate::storage::{HttpStorage, RemoteStorage};

use super::layout::AgentLayout;
use super::monitor::{MonitorHandle, spawn_monitor};
use super::uploader::Uploader;

const ETCD_TOKEN: &str = "etcd_token";
const STOP_GRACE: Duration = Duration::from_secs(3);

/// Paths to the database binaries this agent can launch.
#[derive(Debug, Clone)]
pub struct BinaryPaths {
    pub etcd: PathBuf,
    pub consul: PathBuf,
    pub java: PathBuf,
    pub zookeeper_classpath: String,
}

/// Everything needed to re-execute the process later.
struct ProcessRecord {
    program: PathBuf,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    pid: i32,
}

enum LifecycleEvent {
    Started { pid: i32 },
    StopRequested { pid: i32 },
    ProcessExited { pid: i32, status: String },
}

enum SupervisorRequest {
    Transfer {
        request: Box<TransferRequest>,
        reply: oneshot::Sender<Result<(), AgentError>>,
    },
    #[cfg(test)]
    Inspect {
        reply: oneshot::Sender<Option<i32>>,
    },
}

/// Client side of the supervisor task.
#[derive(Clone)]
pub(crate) struct SupervisorHandle {
    tx: mpsc::Sender<SupervisorRequest>,
}

impl SupervisorHandle {
    pub(crate) async fn transfer(&self, request: TransferRequest) -> Result<(), AgentError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(SupervisorRequest::Transfer {
                request: Box::new(request),
                reply,
            })
            .await
            .map_err(|_err| AgentError::SupervisorGone)?;
        response.await.map_err(|_err| AgentError::SupervisorGone)?
    }

    /// Pid of the currently recorded process, if any.
    #[cfg(test)]
    pub(crate) async fn current_pid(&self) -> Result<Option<i32>, AgentError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(SupervisorRequest::Inspect { reply })
            .await
            .map_err(|_err| AgentError::SupervisorGone)?;
        response.await.map_err(|_err| AgentError::SupervisorGone)
    }
}

/// Owns all process state. Requests are serialized through its channel, so
/// two concurrent control calls can never race on the process record.
pub(crate) struct Supervisor {
    layout: AgentLayout,
    binaries: BinaryPaths,
    record: Option<ProcessRecord>,
    monitor: Option<MonitorHandle>,
    stop_grace: Duration,
    events_tx: mpsc::UnboundedSender<LifecycleEvent>,
}

pub(crate) fn spawn_supervisor(layout: AgentLayout, binaries: BinaryPaths) -> SupervisorHandle {
    spawn_supervisor_with_grace(layout, binaries, STOP_GRACE)
}

pub(crate) fn spawn_supervisor_with_grace(
    layout: AgentLayout,
    binaries: BinaryPaths,
    stop_grace: Duration,
) -> SupervisorHandle {
    let (tx, rx) = mpsc::channel(16);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let supervisor = Supervisor {
        layout,
        binaries,
        record: None,
        monitor: None,
        stop_grace,
        events_tx,
    };
    tokio::spawn(run(supervisor, rx, events_rx));
    SupervisorHandle { tx }
}

async fn run(
    mut supervisor: Supervisor,
    mut requests: mpsc::Receiver<SupervisorRequest>,
    mut events: mpsc::UnboundedReceiver<LifecycleEvent>,
) {
    loop {
        tokio::select! {
            request = requests.recv() => {
                let Some(request) = request else { break };
                match request {
                    SupervisorRequest::Transfer { request, reply } => {
                        let result = supervisor.handle(*request).await;
                        let _ = reply.send(result);
                    }
                    #[cfg(test)]
                    SupervisorRequest::Inspect { reply } => {
                        let _ = reply.send(supervisor.record.as_ref().map(|r| r.pid));
                    }
                }
            }
            Some(event) = events.recv() => supervisor.observe(&event),
        }
    }
    if let Some(monitor) = supervisor.monitor.take() {
        monitor.shutdown().await;
    }
}

impl Supervisor {
    async fn handle(&mut self, request: TransferRequest) -> Result<(), AgentError> {
        info!(operation = %request.operation, database = %request.database, "control request");
        match request.operation {
            ControlOperation::Start => self.start(&request).await,
            ControlOperation::Restart => self.restart().await,
            ControlOperation::Stop => self.stop(&request).await,
        }
    }

    fn observe(&mut self, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::Started { pid } => {
                info!(pid, "database process running");
            }
            LifecycleEvent::StopRequested { pid } => {
                info!(pid, "database stop requested");
            }
            LifecycleEvent::ProcessExited { pid, status } => {
                info!(pid, status = %status, "database process exited");
            }
        }
    }

    async fn start(&mut self, request: &TransferRequest) -> Result<(), AgentError> {
        let peer_ips = request.peer_ips();
        let index = request.server_index as usize;
        if index >= peer_ips.len() {
            return Err(AgentError::ServerIndexOutOfRange {
                index,
                peers: peer_ips.len(),
            });
        }
        if self.record.is_some() {
            warn!("start with a process already recorded; replacing the record");
        }
        self.persist_storage_key(request).await?;

        let spec = match request.database {
            crate::args::Database::Etcdv2 | crate::args::Database::Etcdv3 => {
                self.prepare_etcd(request, &peer_ips, index).await?
            }
            crate::args::Database::Zookeeper => {
                self.prepare_zookeeper(request, &peer_ips).await?
            }
            crate::args::Database::Consul => {
                self.prepare_consul(&peer_ips, index).await?
            }
        };
        self.launch(spec).await
    }

    async fn restart(&mut self) -> Result<(), AgentError> {
        let Some(record) = self.record.take() else {
            return Err(AgentError::NothingToRestart);
        };
        info!(program = %record.program.display(), "restarting recorded command");
        let spec = CommandSpec {
            program: record.program,
            args: record.args,
            current_dir: record.current_dir,
        };
        self.launch(spec).await
    }

    async fn stop(&mut self, request: &TransferRequest) -> Result<(), AgentError> {
        let Some(record) = self.record.take() else {
            return Err(AgentError::NothingToStop);
        };
        // Collect a little more monitoring data before the kill.
        if !self.stop_grace.is_zero() {
            tokio::time::sleep(self.stop_grace).await;
        }
        let _ = self.events_tx.send(LifecycleEvent::StopRequested { pid: record.pid });
        info!(pid = record.pid, "stopping database process");
        // SAFETY: kill with SIGTERM only sends a signal; no memory is touched.
        let rc = unsafe { libc::kill(record.pid, libc::SIGTERM) };
        if rc != 0 {
            return Err(AgentError::Signal {
                pid: record.pid,
                source: std::io::Error::last_os_error(),
            });
        }
        if let Some(monitor) = self.monitor.take() {
            monitor.shutdown().await;
        }
        self.upload_artifacts(request);
        Ok(())
    }

    /// Fires the artifact upload in the background so the control reply is
    /// not held behind thirty retry budgets.
    fn upload_artifacts(&self, request: &TransferRequest) {
        if request.storage_bucket.is_empty() {
            debug!("no storage bucket configured; skipping artifact upload");
            return;
        }
        let storage: Arc<dyn RemoteStorage> = Arc::new(HttpStorage::new(
            request.storage_key.clone(),
            request.storage_endpoint.clone(),
        ));
        let uploader = Uploader::new(
            storage,
            request.storage_bucket.clone(),
            request.storage_subdirectory.clone(),
            request.test_name.clone(),
            request.server_index,
        );
        let files = vec![
            self.layout.database_log(),
            self.layout.monitor_csv(),
            self.layout.agent_log(),
        ];
        tokio::spawn(async move {
            uploader.upload_all(&files).await;
        });
    }

    async fn persist_storage_key(&self, request: &TransferRequest) -> Result<(), AgentError> {
        if request.storage_key.is_empty() {
            return Ok(());
        }
        tokio::fs::write(self.layout.storage_key(), &request.storage_key)
            .await
            .map_err(|source| AgentError::Io {
                context: "persist storage key",
                source,
            })
    }

    async fn prepare_etcd(
        &self,
        request: &TransferRequest,
        peer_ips: &[String],
        index: usize,
    ) -> Result<CommandSpec, AgentError> {
        check_binary(&self.binaries.etcd).await?;
        let data_dir = self.layout.etcd_data_dir();
        reset_dir(&data_dir).await?;

        let names: Vec<String> = (0..peer_ips.len()).map(|i| format!("etcd-{}", i + 1)).collect();
        let client_url = format!("http://{}:2379", peer_ips[index]);
        let peer_url = format!("http://{}:2380", peer_ips[index]);
        let cluster = names
            .iter()
            .zip(peer_ips)
            .map(|(name, ip)| format!("{}=http://{}:2380", name, ip))
            .collect::<Vec<_>>()
            .join(",");

        let mut args = vec![
            "--name".to_owned(),
            names[index].clone(),
            "--data-dir".to_owned(),
            data_dir.display().to_string(),
            "--listen-client-urls".to_owned(),
            client_url.clone(),
            "--advertise-client-urls".to_owned(),
            client_url,
            "--listen-peer-urls".to_owned(),
            peer_url.clone(),
            "--initial-advertise-peer-urls".to_owned(),
            peer_url,
            "--initial-cluster-token".to_owned(),
            ETCD_TOKEN.to_owned(),
            "--initial-cluster".to_owned(),
            cluster,
            "--initial-cluster-state".to_owned(),
            "new".to_owned(),
        ];
        if let Some(compression) = &request.etcd_compression {
            // Release-specific flag; recent builds accept it, old ones abort.
            args.push("--experimental-compression".to_owned());
            args.push(compression.clone());
        }
        Ok(CommandSpec {
            program: self.binaries.etcd.clone(),
            args,
            current_dir: None,
        })
    }

    async fn prepare_consul(
        &self,
        peer_ips: &[String],
        index: usize,
    ) -> Result<CommandSpec, AgentError> {
        check_binary(&self.binaries.consul).await?;
        let data_dir = self.layout.consul_data_dir();
        reset_dir(&data_dir).await?;

        let mut args = vec![
            "agent".to_owned(),
            "-server".to_owned(),
            "-data-dir".to_owned(),
            data_dir.display().to_string(),
            "-bind".to_owned(),
            peer_ips[index].clone(),
            "-client".to_owned(),
            peer_ips[index].clone(),
        ];
        if index == 0 {
            args.push("-bootstrap-expect".to_owned());
            args.push(peer_ips.len().to_string());
        } else {
            args.push("-join".to_owned());
            args.push(peer_ips[0].clone());
        }
        Ok(CommandSpec {
            program: self.binaries.consul.clone(),
            args,
            current_dir: None,
        })
    }

    async fn prepare_zookeeper(
        &self,
        request: &TransferRequest,
        peer_ips: &[String],
    ) -> Result<CommandSpec, AgentError> {
        check_binary(&self.binaries.java).await?;
        let data_dir = self.layout.zookeeper_data_dir();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|source| AgentError::ResetDataDirectory {
                path: data_dir.clone(),
                source,
            })?;
        tokio::fs::write(self.layout.zookeeper_myid(), request.zookeeper_myid.to_string())
            .await
            .map_err(|source| AgentError::Io {
                context: "write zookeeper myid",
                source,
            })?;
        let config = zookeeper_config(
            &data_dir.display().to_string(),
            request.zookeeper_max_client_cnxns,
            request.zookeeper_snap_count,
            peer_ips,
        );
        let config_path = self.layout.zookeeper_config();
        tokio::fs::write(&config_path, config)
            .await
            .map_err(|source| AgentError::Io {
                context: "write zookeeper config",
                source,
            })?;

        Ok(CommandSpec {
            program: self.binaries.java.clone(),
            args: vec![
                "-cp".to_owned(),
                self.binaries.zookeeper_classpath.clone(),
                "org.apache.zookeeper.server.quorum.QuorumPeerMain".to_owned(),
                config_path.display().to_string(),
            ],
            current_dir: Some(self.layout.zookeeper_working_dir()),
        })
    }

    async fn launch(&mut self, spec: CommandSpec) -> Result<(), AgentError> {
        let log_path = self.layout.database_log();
        let log = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|source| AgentError::OpenDatabaseLog {
                path: log_path,
                source,
            })?;
        let stderr_log = log.try_clone().map_err(|source| AgentError::Io {
            context: "clone database log handle",
            source,
        })?;

        let mut command = tokio::process::Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(stderr_log));
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }
        info!(program = %spec.program.display(), args = ?spec.args, "starting database process");
        let mut child = command.spawn().map_err(|source| AgentError::Spawn {
            program: spec.program.display().to_string(),
            source,
        })?;
        let pid = child
            .id()
            .and_then(|pid| i32::try_from(pid).ok())
            .ok_or(AgentError::MissingPid)?;
        info!(pid, "database process started");
        let _ = self.events_tx.send(LifecycleEvent::Started { pid });

        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let status = match child.wait().await {
                Ok(status) => status.to_string(),
                Err(error) => format!("wait failed: {}", error),
            };
            let _ = events.send(LifecycleEvent::ProcessExited { pid, status });
        });

        if let Some(previous) = self.monitor.take() {
            previous.shutdown().await;
        }
        self.monitor = Some(spawn_monitor(pid, self.layout.monitor_csv()));

        self.record = Some(ProcessRecord {
            program: spec.program,
            args: spec.args,
            current_dir: spec.current_dir,
            pid,
        });
        Ok(())
    }
}

struct CommandSpec {
    program: PathBuf,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

async fn check_binary(path: &std::path::Path) -> Result<(), AgentError> {
    tokio::fs::metadata(path)
        .await
        .map(|_| ())
        .map_err(|source| AgentError::MissingBinary {
            path: path.to_path_buf(),
            source,
        })
}

/// Removes and recreates a data directory so every start is from scratch.
async fn reset_dir(path: &std::path::Path) -> Result<(), AgentError> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {}
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(AgentError::ResetDataDirectory {
                path: path.to_path_buf(),
                source,
            });
        }
    }
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| AgentError::ResetDataDirectory {
            path: path.to_path_buf(),
            source,
        })
}

/// Quorum config for this release line: fixed ports, five-tick limits.
pub(super) fn zookeeper_config(
    data_dir: &str,
    max_client_cnxns: u64,
    snap_count: u64,
    peer_ips: &[String],
) -> String {
    let mut config = format!(
        "tickTime=2000\ndataDir={}\nclientPort=2181\ninitLimit=5\nsyncLimit=5\nmaxClientCnxns={}\nsnapCount={}\n",
        data_dir, max_client_cnxns, snap_count
    );
    for (i, ip) in peer_ips.iter().enumerate() {
        config.push_str(&format!("server.{}={}:2888:3888\n", i + 1, ip));
    }
    config
}
