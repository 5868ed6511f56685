// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact relay service.
//!
//! The handlers derive the client identity from the connection, hand the
//! payload to [`ContactService`] and map each outcome to a stable status code.

use crate::config::{is_valid_origin, Config, CorsConfig};
use crate::contact::{ContactError, ContactService};
use crate::limiter::{ClientId, RateLimitStore, RateLimiter};
use crate::notifier::Notifier;
use crate::validator::ContactPayload;
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Shared application state.
pub struct AppState<N, L = RateLimiter> {
    pub service: ContactService<N, L>,
    pub config: Config,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// One invalid payload field.
#[derive(Debug, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub msg: String,
}

/// Successful submission response.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: &'static str,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            error: error.into(),
            code,
            errors: Vec::new(),
            retry_after_secs: None,
        }
    }
}

/// Build the application router.
pub fn router<N, L>(state: Arc<AppState<N, L>>) -> Router
where
    N: Notifier,
    L: RateLimitStore,
{
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/test", get(alive))
        .route("/api/contact", post(submit_contact::<N, L>));

    if state.config.metrics.enabled {
        router = router.route(&state.config.metrics.path, get(metrics::<N, L>));
    }

    router
        .layer(cors_layer(&state.config.cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy for the configured origins; `*` allows any origin.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(config.allowed_origins.iter().filter_map(|origin| {
            if !is_valid_origin(origin) {
                warn!(%origin, "Ignoring invalid CORS origin");
                return None;
            }
            origin.parse::<HeaderValue>().ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "contact-relay",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Plain-text liveness probe.
pub async fn alive() -> &'static str {
    "Server is alive!"
}

/// Prometheus exposition endpoint.
pub async fn metrics<N, L>(State(state): State<Arc<AppState<N, L>>>) -> Response
where
    N: Notifier,
    L: RateLimitStore,
{
    match state.service.metrics().render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Accept a contact form submission.
pub async fn submit_contact<N, L>(
    State(state): State<Arc<AppState<N, L>>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    payload: Result<Json<ContactPayload>, JsonRejection>,
) -> Response
where
    N: Notifier,
    L: RateLimitStore,
{
    let client = client_id(&headers, addr, state.config.trust_forwarded_for);

    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            info!(%client, error = %rejection.body_text(), "Rejected malformed contact body");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(rejection.body_text(), "INVALID_BODY")),
            )
                .into_response();
        }
    };

    debug!(%client, "Processing contact submission");

    match state.service.submit(&payload, &client).await {
        Ok(()) => (
            StatusCode::OK,
            Json(SuccessResponse {
                message: "Message sent successfully!",
            }),
        )
            .into_response(),
        Err(ContactError::ValidationFailed(errors)) => {
            let mut body = ErrorResponse::new("Validation failed", "VALIDATION_FAILED");
            body.errors = errors
                .iter()
                .map(|e| FieldError {
                    field: e.field(),
                    msg: e.to_string(),
                })
                .collect();
            (StatusCode::BAD_REQUEST, Json(body)).into_response()
        }
        Err(ContactError::RateLimited { retry_after }) => {
            let retry_secs = retry_after_secs(retry_after);
            let mut body = ErrorResponse::new(
                "Too many contact attempts, please try again later",
                "RATE_LIMITED",
            );
            body.retry_after_secs = Some(retry_secs);
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_secs.to_string())],
                Json(body),
            )
                .into_response()
        }
        Err(ContactError::DispatchFailed(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Failed to send message", "DISPATCH_FAILED")),
        )
            .into_response(),
    }
}

/// Identify the caller by peer address, or by the hop the trusted proxy
/// appended to `X-Forwarded-For`.
///
/// Only the rightmost entry is written by the proxy; everything to its left
/// arrives from the caller and is ignored.
fn client_id(headers: &HeaderMap, peer: SocketAddr, trust_forwarded_for: bool) -> ClientId {
    if trust_forwarded_for {
        let forwarded = headers
            .get_all("x-forwarded-for")
            .iter()
            .last()
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok());
        if let Some(ip) = forwarded {
            return ClientId::from(ip);
        }
    }
    ClientId::from(peer.ip())
}

/// Whole seconds, rounded up, never zero.
fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
    secs.max(1)
}
