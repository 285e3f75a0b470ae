use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use sea_orm::DbErr;
use serde_json::json;

use crate::entities::booking::BookingStatus;

/// Every failure the booking service can surface to a caller.
///
/// Domain variants carry enough detail for the caller to build an
/// actionable message; storage failures are logged and sanitized.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{facility} is already booked at an overlapping time on {date}")]
    Conflict { facility: String, date: NaiveDate },

    #[error("Not enough {equipment}: requested {requested}, available {available}")]
    Capacity {
        equipment: String,
        requested: i32,
        available: i32,
    },

    #[error("Cannot {action} a booking that is {status}")]
    InvalidTransition {
        action: &'static str,
        status: BookingStatus,
    },

    #[error("{0}")]
    DuplicateRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict { .. } => "CONFLICT",
            AppError::Capacity { .. } => "CAPACITY_EXCEEDED",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::DuplicateRequest(_) => "DUPLICATE_REQUEST",
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. }
            | AppError::Capacity { .. }
            | AppError::InvalidTransition { .. }
            | AppError::DuplicateRequest(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                "An internal error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let mut body = json!({
            "error": message,
            "code": self.code(),
        });

        match &self {
            AppError::Capacity {
                equipment,
                requested,
                available,
            } => {
                body["equipment"] = json!(equipment);
                body["requested"] = json!(requested);
                body["available"] = json!(available);
            }
            AppError::Conflict { facility, date } => {
                body["facility"] = json!(facility);
                body["date"] = json!(date);
            }
            AppError::InvalidTransition { status, .. } => {
                body["status"] = json!(status);
            }
            _ => {}
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_message_names_both_quantities() {
        let err = AppError::Capacity {
            equipment: "Projector".to_string(),
            requested: 3,
            available: 2,
        };

        assert_eq!(err.to_string(), "Not enough Projector: requested 3, available 2");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "CAPACITY_EXCEEDED");
    }

    #[test]
    fn invalid_transition_names_current_status() {
        let err = AppError::InvalidTransition {
            action: "cancel",
            status: BookingStatus::Cancelled,
        };

        assert_eq!(err.to_string(), "Cannot cancel a booking that is CANCELLED");
    }

    #[test]
    fn database_errors_are_internal() {
        let err = AppError::from(DbErr::Custom("boom".to_string()));

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }
}
