//! Error types for the relay pipeline.
//!
//! Callers only ever see one of three fixed messages; the full variant
//! with its cause chain is logged internally for diagnosis.

use axum::http::StatusCode;
use thiserror::Error;

use crate::fetch::FetchError;
use crate::publish::PublishError;
use crate::secrets::SecretError;

/// Errors that can occur while relaying a webhook delivery.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The secret bundle could not be acquired.
    #[error("failed to acquire secret bundle")]
    Secret(#[source] SecretError),

    /// The acquired bundle carries an empty signing secret.
    #[error("webhook signing secret is empty")]
    EmptySigningSecret,

    /// The delivery body is not valid JSON or not a push payload.
    #[error("malformed delivery payload")]
    Parse(#[source] serde_json::Error),

    /// HMAC verification of the delivery failed.
    #[error("webhook signature mismatch")]
    InvalidSignature,

    /// The delivery is well-formed but not something the relay handles.
    #[error("invalid delivery: {0}")]
    InvalidEvent(String),

    /// The archive download failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The object store upload failed.
    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl RelayError {
    /// HTTP status for the outward response.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fixed caller-facing message. Internal detail never leaks here;
    /// fetch and publish failures are indistinguishable to the caller.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Secret(_) | Self::EmptySigningSecret => "Error acquiring Bitbucket Secret.",
            Self::InvalidSignature => "Signature is not valid",
            Self::Parse(_) | Self::InvalidEvent(_) | Self::Fetch(_) | Self::Publish(_) => {
                "Error acquiring zip. Check Bitbucket token/secret."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            RelayError::InvalidSignature.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            RelayError::EmptySigningSecret.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            RelayError::Fetch(FetchError::Status { status: 404 }).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_processing_failures_share_one_message() {
        let fetch = RelayError::Fetch(FetchError::Status { status: 404 });
        let publish = RelayError::Publish(PublishError::Status { status: 403 });
        let event = RelayError::InvalidEvent("unexpected ref type TAG".to_string());

        assert_eq!(fetch.public_message(), publish.public_message());
        assert_eq!(fetch.public_message(), event.public_message());
    }

    #[test]
    fn test_secret_failures_share_one_message() {
        assert_eq!(
            RelayError::EmptySigningSecret.public_message(),
            "Error acquiring Bitbucket Secret."
        );
    }
}
