//! Signing-secret retrieval.
//!
//! The relay authenticates deliveries with a shared signing secret and
//! talks to Bitbucket Server with an access token; both arrive together as
//! one JSON secret bundle. The provider is an injected collaborator so the
//! pipeline can be exercised without a secret store.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Secret bundle holding the webhook signing secret and the Bitbucket
/// Server access token.
///
/// Field names match the stored secret document.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretBundle {
    /// Webhook signing secret shared with Bitbucket Server
    pub bitbucket_secret: String,
    /// Bearer token for the Bitbucket Server REST API
    pub bitbucket_token: String,
}

/// Errors raised while acquiring the secret bundle.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The secret could not be read from its backing store.
    #[error("failed to read secret {secret_id}")]
    Unavailable {
        secret_id: String,
        #[source]
        source: std::io::Error,
    },

    /// The secret was read but is not a valid bundle document.
    #[error("secret {secret_id} is not a valid secret bundle")]
    Malformed {
        secret_id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Source of the relay's secret bundle.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    /// Fetch and decode the secret bundle identified by `secret_id`.
    async fn get_secret(&self, secret_id: &str) -> Result<SecretBundle, SecretError>;
}

/// Secret provider backed by a mounted secret file, the usual delivery
/// path on container platforms. `secret_id` is the file path.
pub struct FileSecretProvider;

#[async_trait]
impl SecretProvider for FileSecretProvider {
    async fn get_secret(&self, secret_id: &str) -> Result<SecretBundle, SecretError> {
        let raw = tokio::fs::read(secret_id)
            .await
            .map_err(|source| SecretError::Unavailable {
                secret_id: secret_id.to_string(),
                source,
            })?;

        let bundle: SecretBundle =
            serde_json::from_slice(&raw).map_err(|source| SecretError::Malformed {
                secret_id: secret_id.to_string(),
                source,
            })?;

        info!(
            secret_id = %secret_id,
            signing_secret_set = !bundle.bitbucket_secret.is_empty(),
            token_set = !bundle.bitbucket_token.is_empty(),
            "secret_bundle_loaded"
        );

        Ok(bundle)
    }
}
