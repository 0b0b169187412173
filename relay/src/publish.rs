//! Archive publication to object storage.
//!
//! The publisher streams the fetched archive straight into an
//! S3-compatible PUT; the bytes are never held in memory as a whole.

use async_trait::async_trait;
use reqwest::{Body, Client};
use thiserror::Error;
use tracing::{error, info};

use crate::fetch::ArchiveStream;

/// Object key for a repository branch archive.
///
/// Forward slashes are not allowed in the leaf segment of the key; only
/// the first encoded slash in the branch name becomes a hyphen, deeper
/// segments keep their escapes.
pub fn archive_key(project: &str, repo: &str, escaped_branch: &str) -> String {
    format!(
        "{}/{}/{}.zip",
        project,
        repo,
        escaped_branch.replacen("%2F", "-", 1)
    )
}

/// Errors raised while storing an archive.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The upload never completed.
    #[error("object store request failed")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("object store returned status {status}")]
    Status { status: u16 },
}

/// Sink for fetched archives.
#[async_trait]
pub trait ArchivePublisher: Send + Sync {
    /// Store `archive` under `key` in `bucket`.
    async fn put(&self, bucket: &str, key: &str, archive: ArchiveStream)
        -> Result<(), PublishError>;
}

/// S3-compatible object store spoken over plain HTTP PUTs.
///
/// Every object is stored with server-side encryption requested.
pub struct HttpObjectStore {
    client: Client,
    endpoint: String,
}

impl HttpObjectStore {
    /// Create a store client against the given endpoint base URL.
    pub fn new(client: Client, endpoint: String) -> Self {
        Self { client, endpoint }
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint.trim_end_matches('/'), bucket, key)
    }
}

#[async_trait]
impl ArchivePublisher for HttpObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        archive: ArchiveStream,
    ) -> Result<(), PublishError> {
        info!(bucket = %bucket, key = %key, "archive_upload_starting");

        let resp = self
            .client
            .put(self.object_url(bucket, key))
            .header("x-amz-server-side-encryption", "AES256")
            .body(Body::wrap_stream(archive))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            error!(
                bucket = %bucket,
                key = %key,
                status_code = status.as_u16(),
                "archive_upload_bad_status"
            );
            return Err(PublishError::Status {
                status: status.as_u16(),
            });
        }

        info!(
            bucket = %bucket,
            key = %key,
            status_code = status.as_u16(),
            "archive_upload_complete"
        );

        Ok(())
    }
}
