//! Axum middleware adapter for the rate limiter facade.
//!
//! The one outward surface the routing layer mounts. One instance of
//! [`AdmissionState`] is built per route group, pairing the shared limiter
//! with that group's policy; the middleware extracts the client identifier
//! (authenticated principal when present, source IP otherwise) and turns a
//! `Limited` decision into a 429 with a retry hint.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::observability::metrics;
use crate::ratelimit::facade::{apply_headers, RateLimiter};
use crate::ratelimit::policy::{Decision, RateLimitPolicy};

const DEFAULT_REJECTION_MESSAGE: &str = "Too many requests, please try again later.";

/// Authenticated principal, inserted into request extensions by the auth
/// layer upstream of this middleware.
#[derive(Debug, Clone)]
pub struct ClientIdentity(pub String);

/// Per-route-group middleware state.
pub struct AdmissionState {
    pub limiter: Arc<RateLimiter>,
    pub policy: RateLimitPolicy,
}

/// Middleware function enforcing the route group's policy.
pub async fn admission_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AdmissionState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let identifier = match request.extensions().get::<ClientIdentity>() {
        Some(identity) => identity.0.clone(),
        None => addr.ip().to_string(),
    };

    let decision = state.limiter.evaluate(&identifier, &state.policy).await;

    match &decision {
        Decision::Allowed { .. } => {
            let mut response = next.run(request).await;
            apply_headers(response.headers_mut(), &state.policy, &decision);
            response
        }
        Decision::Limited {
            retry_after_secs, ..
        } => {
            tracing::warn!(client = %identifier, retry_after_secs, "Rate limit exceeded");
            metrics::record_rate_limited("window_quota");

            let message = state
                .policy
                .rejection_message
                .as_deref()
                .unwrap_or(DEFAULT_REJECTION_MESSAGE);
            let body = serde_json::json!({
                "error": message,
                "retryAfter": format!("{retry_after_secs} seconds"),
            });

            let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
            apply_headers(response.headers_mut(), &state.policy, &decision);
            response
        }
    }
}
