//! Webhook endpoint handlers.
//!
//! Handlers stay thin: adapt the HTTP request into a framework-free
//! delivery, run the relay pipeline, and return the uniform envelope.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tracing::info;

use crate::relay::{Relay, WebhookRequest};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

impl AppState {
    pub fn new(relay: Relay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Bitbucket Server webhook endpoint.
pub async fn bitbucket_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    info!(
        body_length = body.len(),
        has_signature = headers.contains_key("x-hub-signature"),
        event_key = headers
            .get("x-event-key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or(""),
        "webhook_received"
    );

    let request = WebhookRequest {
        headers: flatten_headers(&headers),
        body,
    };

    state.relay.handle(request).await
}

/// Flatten axum's header map into plain name/value pairs; values that are
/// not valid UTF-8 are dropped.
fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
