//! HTTP response types and utilities
//!
//! Standardized JSON envelope for the endpoints this service owns, and the
//! mapping from [`AppError`] to status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::AppError;

/// Status used when the caller went away before we could answer
pub const CLIENT_CLOSED_REQUEST: u16 = 499;

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
    /// Response timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create an error response
    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            details: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create an error response with details
    pub fn error_with_details(message: String, details: HashMap<String, String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            details: Some(details),
            timestamp: chrono::Utc::now(),
        }
    }
}

pub fn ok<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

pub fn bad_request(message: &str) -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(message.to_string())),
    )
}

/// HTTP status for each error kind
pub fn status_for(error: &AppError) -> StatusCode {
    match error {
        AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        AppError::Decode { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::Validation { .. } => StatusCode::BAD_REQUEST,
        AppError::UpstreamUnavailable { .. }
        | AppError::UpstreamRejected { .. }
        | AppError::Timeout { .. } => StatusCode::BAD_GATEWAY,
        AppError::ConfigMissing { .. } => StatusCode::SERVICE_UNAVAILABLE,
        AppError::Cancelled => StatusCode::from_u16(CLIENT_CLOSED_REQUEST)
            .unwrap_or(StatusCode::SERVICE_UNAVAILABLE),
        AppError::Encode { .. }
        | AppError::InvalidRequest { .. }
        | AppError::Configuration { .. }
        | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert AppError to appropriate HTTP response
pub fn handle_error(error: AppError) -> impl IntoResponse {
    let status = status_for(&error);
    let (message, details) = match &error {
        AppError::UpstreamUnavailable { service, .. } => {
            (format!("{service} service unavailable"), None)
        }
        AppError::UpstreamRejected {
            service,
            status,
            body,
        } => {
            let details = HashMap::from([
                ("upstream_status".to_string(), status.to_string()),
                ("upstream_body".to_string(), body.clone()),
            ]);
            (format!("{service} service rejected the request"), Some(details))
        }
        AppError::Timeout { service } => (format!("{service} service timed out"), None),
        AppError::ConfigMissing { key } => (format!("Feature unavailable: {key} is not configured"), None),
        AppError::Encode { .. } | AppError::InvalidRequest { .. } | AppError::Internal { .. } => {
            ("Internal server error".to_string(), None)
        }
        AppError::Configuration { .. } => ("Service misconfigured".to_string(), None),
        _ => (error.to_string(), None),
    };

    let body = match details {
        Some(details) => ApiResponse::<()>::error_with_details(message, details),
        None => ApiResponse::<()>::error(message),
    };
    (status, Json(body))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        handle_error(self).into_response()
    }
}
