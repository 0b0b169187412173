//! The relay pipeline.
//!
//! One webhook delivery is one linear, stateless transaction: acquire the
//! secret bundle, answer the diagnostics probe, verify the signature,
//! download the pushed branch archive, and hand it to object storage.
//! Collaborators are injected so the pipeline runs the same against mocks
//! as against the real network.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::RelayError;
use crate::event::{PushEvent, BRANCH_REF_TYPE};
use crate::fetch::{escape_branch, ArchiveFetcher, RepoFetchConfig};
use crate::publish::{archive_key, ArchivePublisher};
use crate::response::ApiResponse;
use crate::secrets::SecretProvider;
use crate::web::headers::normalize_headers;
use crate::web::signature::verify_signature;

/// Header carrying the HMAC digest of the delivery body.
const SIGNATURE_HEADER: &str = "x-hub-signature";

/// Header identifying the event kind.
const EVENT_KEY_HEADER: &str = "x-event-key";

/// Event key of Bitbucket's "Test connection" probe.
const DIAGNOSTICS_PING: &str = "diagnostics:ping";

/// Raw inbound delivery, decoupled from the HTTP framework.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    /// Request headers as plain name/value pairs
    pub headers: HashMap<String, String>,
    /// Raw request body, exactly as signed by the sender
    pub body: String,
}

/// Webhook relay orchestrator.
pub struct Relay {
    config: Config,
    secrets: Arc<dyn SecretProvider>,
    fetcher: Arc<dyn ArchiveFetcher>,
    publisher: Arc<dyn ArchivePublisher>,
}

impl Relay {
    /// Create a relay with injected collaborators.
    pub fn new(
        config: Config,
        secrets: Arc<dyn SecretProvider>,
        fetcher: Arc<dyn ArchiveFetcher>,
        publisher: Arc<dyn ArchivePublisher>,
    ) -> Self {
        Self {
            config,
            secrets,
            fetcher,
            publisher,
        }
    }

    /// Process one webhook delivery end to end.
    ///
    /// Never fails outward: every internal error is logged with its cause
    /// and mapped to one of the fixed envelope messages.
    pub async fn handle(&self, request: WebhookRequest) -> ApiResponse {
        match self.process(&request).await {
            Ok(response) => response,
            Err(err) => {
                error!(error = %err, detail = ?err, "webhook_processing_failed");
                ApiResponse::error(err.status_code(), err.public_message())
            }
        }
    }

    async fn process(&self, request: &WebhookRequest) -> Result<ApiResponse, RelayError> {
        // The signing secret gates everything else; acquire and validate
        // it before touching the payload.
        let secret = self
            .secrets
            .get_secret(&self.config.secret_name)
            .await
            .map_err(RelayError::Secret)?;

        if secret.bitbucket_secret.is_empty() {
            return Err(RelayError::EmptySigningSecret);
        }

        let headers = normalize_headers(&request.headers);

        let payload: serde_json::Value =
            serde_json::from_str(&request.body).map_err(RelayError::Parse)?;

        // Bitbucket's "Test connection" probe carries no signed payload and
        // is answered before any signature work.
        if headers.get(EVENT_KEY_HEADER).map(String::as_str) == Some(DIAGNOSTICS_PING) {
            info!("diagnostics_ping_received");
            return Ok(ApiResponse::ok(Some("Webhook configured successfully")));
        }

        let signature = headers
            .get(SIGNATURE_HEADER)
            .map(String::as_str)
            .unwrap_or_default();

        if !verify_signature(&secret.bitbucket_secret, signature, &request.body) {
            warn!("webhook_signature_invalid");
            return Err(RelayError::InvalidSignature);
        }
        info!("webhook_signature_valid");

        let event: PushEvent = serde_json::from_value(payload).map_err(RelayError::Parse)?;

        let change = event
            .changes
            .first()
            .ok_or_else(|| RelayError::InvalidEvent("delivery carries no ref changes".into()))?;

        if change.git_ref.ref_type != BRANCH_REF_TYPE {
            return Err(RelayError::InvalidEvent(format!(
                "unexpected ref type {}",
                change.git_ref.ref_type
            )));
        }

        let fetch_config = RepoFetchConfig {
            server_url: self.config.server_url.clone(),
            project: event.repository.project.key.clone(),
            repo: event.repository.name.clone(),
            branch: escape_branch(&change.git_ref.display_id),
            token: secret.bitbucket_token.clone(),
        };

        let archive = self.fetcher.fetch(&fetch_config).await?;

        let key = archive_key(&fetch_config.project, &fetch_config.repo, &fetch_config.branch);
        self.publisher
            .put(&self.config.bucket, &key, archive)
            .await?;

        info!(bucket = %self.config.bucket, key = %key, "archive_relayed");

        Ok(ApiResponse::ok(Some("success")))
    }
}
