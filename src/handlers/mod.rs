pub mod admin;
pub mod bookings;
pub mod facilities;

use axum::body::Bytes;
use serde::Deserialize;

use crate::engine::lifecycle::check_reason;
use crate::error::{AppError, AppResult};

/// Optional body of cancel and reject requests.
#[derive(Debug, Default, Deserialize)]
pub struct ReasonRequest {
    pub reason: Option<String>,
}

/// An empty body means no reason was given.
pub(crate) fn parse_reason(body: &Bytes) -> AppResult<Option<String>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let request: ReasonRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidArgument(format!("Invalid request body: {}", e)))?;
    let reason = request
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    check_reason(reason.as_deref())?;
    Ok(reason)
}
