//! A scripted in-memory storage backend for upload tests.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StorageError;

use super::RemoteStorage;

/// Fails the first N uploads, then records every successful remote name.
pub(crate) struct MockStorage {
    pub(crate) attempts: Arc<AtomicU64>,
    fail_first: u64,
    uploaded: Arc<Mutex<Vec<String>>>,
}

impl MockStorage {
    pub(crate) fn new() -> Self {
        Self::failing_first(0)
    }

    pub(crate) fn failing_first(failures: u64) -> Self {
        Self {
            attempts: Arc::new(AtomicU64::new(0)),
            fail_first: failures,
            uploaded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) async fn uploaded_names(&self) -> Vec<String> {
        self.uploaded.lock().await.clone()
    }
}

#[async_trait]
impl RemoteStorage for MockStorage {
    async fn upload_file(
        &self,
        _bucket: &str,
        _local: &Path,
        remote: &str,
    ) -> Result<(), StorageError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_first {
            return Err(StorageError::Injected);
        }
        self.uploaded.lock().await.push(remote.to_owned());
        Ok(())
    }
}
