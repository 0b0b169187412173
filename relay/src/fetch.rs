//! Branch-archive retrieval from Bitbucket Server.
//!
//! One authenticated GET against the archive REST endpoint, streamed back
//! without buffering. No retries; a failed download fails the delivery.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;
use thiserror::Error;
use tracing::{error, info};

use crate::config::ProxyConfig;

/// Characters kept verbatim when escaping a branch name, matching
/// JavaScript's `encodeURIComponent` unreserved set.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Escape a branch display name for the archive URL and the object key.
pub fn escape_branch(display_id: &str) -> String {
    utf8_percent_encode(display_id, COMPONENT).to_string()
}

/// Everything needed for one archive download, assembled per delivery from
/// the event payload, the secret bundle, and process configuration.
#[derive(Debug, Clone)]
pub struct RepoFetchConfig {
    /// Bitbucket Server base URL
    pub server_url: String,
    /// Project key owning the repository
    pub project: String,
    /// Repository slug
    pub repo: String,
    /// URL-escaped branch display name
    pub branch: String,
    /// Bearer token for the REST API
    pub token: String,
}

impl RepoFetchConfig {
    /// Archive endpoint for this repository and branch.
    pub fn archive_url(&self) -> String {
        format!(
            "{}/rest/api/latest/projects/{}/repos/{}/archive?at=refs/heads/{}&format=zip",
            self.server_url, self.project, self.repo, self.branch
        )
    }
}

/// Archive bytes flowing from fetch to publish without inspection.
pub type ArchiveStream = Pin<Box<dyn Stream<Item = Result<Bytes, FetchError>> + Send + 'static>>;

/// Errors raised while downloading an archive.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never completed.
    #[error("archive request failed")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("archive request returned status {status}")]
    Status { status: u16 },
}

/// Downloads branch archives.
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Issue the archive GET and return the response body as a stream.
    async fn fetch(&self, config: &RepoFetchConfig) -> Result<ArchiveStream, FetchError>;
}

/// Bitbucket Server REST client over a shared `reqwest` client.
///
/// The client is built once at startup with the process-wide timeout and
/// optional forward proxy, then reused across deliveries.
pub struct BitbucketClient {
    client: Client,
}

impl BitbucketClient {
    /// Build the underlying HTTP client.
    pub fn new(timeout: Duration, proxy: Option<&ProxyConfig>) -> anyhow::Result<Self> {
        let mut builder = Client::builder().timeout(timeout);

        if let Some(proxy) = proxy {
            let proxy_url = format!("http://{}:{}", proxy.host, proxy.port);
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl ArchiveFetcher for BitbucketClient {
    async fn fetch(&self, config: &RepoFetchConfig) -> Result<ArchiveStream, FetchError> {
        info!(
            project = %config.project,
            repo = %config.repo,
            branch = %config.branch,
            "archive_fetch_starting"
        );

        let resp = self
            .client
            .get(config.archive_url())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", config.token),
            )
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            error!(
                project = %config.project,
                repo = %config.repo,
                branch = %config.branch,
                status_code = status.as_u16(),
                "archive_fetch_bad_status"
            );
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        info!(status_code = status.as_u16(), "archive_fetch_streaming");

        Ok(Box::pin(resp.bytes_stream().map_err(FetchError::from)))
    }
}
