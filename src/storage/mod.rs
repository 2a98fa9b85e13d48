//! Remote storage for benchmark artifacts.

mod http;

#[cfg(test)]
pub(crate) mod test_support;

use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageError;

pub use http::HttpStorage;

/// Uploads one local file to one remote object name.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the local file cannot be read or the storage
    /// endpoint rejects the upload.
    async fn upload_file(
        &self,
        bucket: &str,
        local: &Path,
        remote: &str,
    ) -> Result<(), StorageError>;
}
