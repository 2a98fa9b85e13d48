use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Working directory {path} does not exist")]
    MissingWorkingDirectory { path: PathBuf },
    #[error("Database binary {path} not found: {source}")]
    MissingBinary {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to reset data directory {path}: {source}")]
    ResetDataDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to open database log {path}: {source}")]
    OpenDatabaseLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Spawned process has no pid")]
    MissingPid,
    #[error("Restart requested but no command has been recorded")]
    NothingToRestart,
    #[error("Stop requested but no process has been started")]
    NothingToStop,
    #[error("Failed to signal pid {pid}: {source}")]
    Signal {
        pid: i32,
        #[source]
        source: std::io::Error,
    },
    #[error("Server index {index} is out of range for a {peers}-peer cluster")]
    ServerIndexOutOfRange { index: usize, peers: usize },
    #[error("Supervisor task is gone")]
    SupervisorGone,
    #[error("I/O error during {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}
