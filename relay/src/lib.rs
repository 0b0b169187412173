//! Archive relay - Bitbucket Server webhook to object storage.
//!
//! The relay receives repository-push webhooks, verifies their HMAC
//! signatures, downloads the pushed branch archive from Bitbucket Server,
//! and stores it in an S3-compatible object store.
//!
//! ## Architecture
//!
//! ```text
//! Bitbucket Server → webhook → signature check → archive GET → object store PUT
//! ```
//!
//! Every delivery is a single stateless transaction; nothing is shared
//! between deliveries beyond the injected clients.

pub mod config;
pub mod error;
pub mod event;
pub mod fetch;
pub mod publish;
pub mod relay;
pub mod response;
pub mod secrets;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ProxyConfig};
pub use error::RelayError;
pub use event::PushEvent;
pub use fetch::{ArchiveFetcher, ArchiveStream, BitbucketClient, RepoFetchConfig};
pub use publish::{archive_key, ArchivePublisher, HttpObjectStore};
pub use relay::{Relay, WebhookRequest};
pub use response::ApiResponse;
pub use secrets::{FileSecretProvider, SecretBundle, SecretProvider};
pub use web::AppState;
