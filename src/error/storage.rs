use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read local file {path}: {source}")]
    ReadLocal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Upload request failed: {source}")]
    Http {
        #[from]
        source: reqwest::Error,
    },
    #[error("Storage endpoint returned status {status} for {remote}")]
    UnexpectedStatus { status: u16, remote: String },
    #[cfg(test)]
    #[error("Injected upload failure")]
    Injected,
}
