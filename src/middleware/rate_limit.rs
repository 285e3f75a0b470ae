use axum::{
    body::Body,
    http::{header, Response, StatusCode},
};
use serde_json::json;
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorError, GovernorLayer};

/// Type alias for the global governor layer (IP-based rate limiting)
pub type GlobalGovernorLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    Body,
>;

/// Create a GovernorLayer for global rate limiting (per IP address)
/// - 1000 requests per minute (one token every 60ms)
/// - Applied before authentication
pub fn create_global_governor() -> GlobalGovernorLayer {
    let config = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(60)
            .burst_size(1000)
            .finish()
            .expect("Global rate limit must have a non-zero period and burst"),
    );

    GovernorLayer::new(config).error_handler(rate_limit_error_handler)
}

/// Render governor rejections in the same JSON shape as `AppError`.
pub fn rate_limit_error_handler(err: GovernorError) -> Response<Body> {
    let (status, code, message, retry_after) = match err {
        GovernorError::TooManyRequests { wait_time, .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            "RATE_LIMITED",
            format!("Too many requests, retry in {} seconds", wait_time),
            Some(wait_time),
        ),
        GovernorError::UnableToExtractKey => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "No authentication found".to_string(),
            None,
        ),
        GovernorError::Other { code, msg, .. } => (
            code,
            "INTERNAL_ERROR",
            msg.unwrap_or_else(|| "Rate limiter failure".to_string()),
            None,
        ),
    };

    if status == StatusCode::TOO_MANY_REQUESTS {
        tracing::warn!(retry_after = ?retry_after, "Request rejected by rate limiter");
    }

    let body = json!({ "error": message, "code": code }).to_string();
    let mut response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(wait) = retry_after {
        response = response.header(header::RETRY_AFTER, wait.to_string());
    }

    response.body(Body::from(body)).unwrap_or_else(|_| {
        let mut fallback = Response::new(Body::empty());
        *fallback.status_mut() = status;
        fallback
    })
}
