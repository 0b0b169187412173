//! Web intake for the relay.
//!
//! A thin axum layer that receives Bitbucket Server webhooks, verifies
//! them, and answers with the uniform envelope. The heavy lifting lives in
//! the relay pipeline; this module only adapts HTTP in and out.

pub mod handlers;
pub mod headers;
pub mod signature;

pub use handlers::{bitbucket_webhook, health, AppState, HealthResponse};
pub use headers::normalize_headers;
pub use signature::verify_signature;
