use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::StorageError;
use crate::storage::RemoteStorage;

pub(crate) const UPLOAD_ATTEMPTS: usize = 30;
const UPLOAD_BACKOFF: Duration = Duration::from_secs(2);

/// Uploads the run artifacts of one agent after its database stops.
pub(crate) struct Uploader {
    storage: Arc<dyn RemoteStorage>,
    bucket: String,
    subdirectory: String,
    test_name: String,
    server_index: u32,
    backoff: Duration,
}

impl Uploader {
    pub(crate) fn new(
        storage: Arc<dyn RemoteStorage>,
        bucket: String,
        subdirectory: String,
        test_name: String,
        server_index: u32,
    ) -> Self {
        Self {
            storage,
            bucket,
            subdirectory,
            test_name,
            server_index,
            backoff: UPLOAD_BACKOFF,
        }
    }

    #[cfg(test)]
    pub(crate) fn without_backoff(mut self) -> Self {
        self.backoff = Duration::ZERO;
        self
    }

    /// Remote object name for a local artifact, namespaced by test and node
    /// unless the file name already carries the test name.
    pub(crate) fn remote_name(&self, local: &Path) -> String {
        let base = local
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let named = if base.starts_with(&self.test_name) {
            base
        } else {
            format!("{}-{}-{}", self.test_name, self.server_index + 1, base)
        };
        if self.subdirectory.is_empty() {
            named
        } else {
            format!("{}/{}", self.subdirectory, named)
        }
    }

    /// Uploads every file, each with its own retry budget. A file that
    /// exhausts its budget is logged and skipped so the remaining artifacts
    /// still get out.
    pub(crate) async fn upload_all(&self, files: &[PathBuf]) {
        for local in files {
            let remote = self.remote_name(local);
            info!(local = %local.display(), remote = %remote, "uploading artifact");
            if let Err(error) = self.upload_with_retry(local, &remote).await {
                warn!(local = %local.display(), %error, "artifact upload abandoned");
            }
        }
    }

    async fn upload_with_retry(&self, local: &Path, remote: &str) -> Result<(), StorageError> {
        let mut last = None;
        for attempt in 1..=UPLOAD_ATTEMPTS {
            match self.storage.upload_file(&self.bucket, local, remote).await {
                Ok(()) => return Ok(()),
                Err(error) => {
                    warn!(attempt, %error, "upload attempt failed");
                    last = Some(error);
                    if attempt < UPLOAD_ATTEMPTS && !self.backoff.is_zero() {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
            }
        }
        Err(last.unwrap_or(StorageError::UnexpectedStatus {
            status: 0,
            remote: remote.to_owned(),
        }))
    }
}
