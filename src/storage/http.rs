use std::path::Path;

use async_trait::async_trait;

use crate::error::StorageError;

use super::RemoteStorage;

const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Media upload against a Google Cloud Storage style HTTP endpoint. The
/// credential blob travels as the bearer token; an endpoint override points
/// tests and private deployments elsewhere.
pub struct HttpStorage {
    client: reqwest::Client,
    endpoint: String,
    credential: String,
}

impl HttpStorage {
    #[must_use]
    pub fn new(credential: String, endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
            credential,
        }
    }
}

#[async_trait]
impl RemoteStorage for HttpStorage {
    async fn upload_file(
        &self,
        bucket: &str,
        local: &Path,
        remote: &str,
    ) -> Result<(), StorageError> {
        let body = tokio::fs::read(local)
            .await
            .map_err(|source| StorageError::ReadLocal {
                path: local.to_path_buf(),
                source,
            })?;
        let url = format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.endpoint, bucket, remote
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.credential)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::UnexpectedStatus {
                status: status.as_u16(),
                remote: remote.to_owned(),
            });
        }
        Ok(())
    }
}
