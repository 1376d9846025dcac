//! API error types and response handling.
//!
//! This module provides a unified error type for all API handlers
//! with automatic conversion to appropriate HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type.
///
/// Each variant maps to a specific HTTP status code and produces a
/// consistent JSON error response.
#[derive(Debug, Clone)]
pub enum ApiError {
    /// 400 Bad Request - Invalid input from client.
    BadRequest {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 404 Not Found - Resource does not exist.
    NotFound {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 422 Unprocessable Entity - The request or configuration is
    /// syntactically valid but semantically wrong.
    Unprocessable {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 500 Internal Server Error - Unexpected server-side error.
    InternalError {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
        /// Optional details (not exposed to client in production).
        details: Option<String>,
    },

    /// 502 Bad Gateway - An upstream enrichment service failed.
    BadGateway {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 503 Service Unavailable - The scanning capability is unavailable.
    ServiceUnavailable {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
        /// Optional additional details.
        details: Option<String>,
    },
}

/// Standard JSON error response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "adapter_not_found",
    "message": "No Bluetooth adapter found",
    "details": null
}))]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "adapter_not_found").
    #[schema(example = "adapter_not_found")]
    pub error: String,

    /// Human-readable error message.
    #[schema(example = "No Bluetooth adapter found")]
    pub message: String,

    /// Optional additional details for debugging.
    #[schema(nullable)]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            Self::BadRequest { error_code, message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: error_code,
                    message,
                    details: None,
                },
            ),

            Self::NotFound { error_code, message } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: error_code,
                    message,
                    details: None,
                },
            ),

            Self::Unprocessable { error_code, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    error: error_code,
                    message,
                    details: None,
                },
            ),

            Self::InternalError {
                error_code,
                message,
                details,
            } => {
                // Log internal errors
                tracing::error!(
                    error_code = %error_code,
                    message = %message,
                    details = ?details,
                    "Internal server error"
                );

                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: error_code,
                        message,
                        details: details.map(|d| serde_json::json!(d)),
                    },
                )
            }

            Self::BadGateway { error_code, message } => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse {
                    error: error_code,
                    message,
                    details: None,
                },
            ),

            Self::ServiceUnavailable {
                error_code,
                message,
                details,
            } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorResponse {
                    error: error_code,
                    message,
                    details: details.map(|d| serde_json::json!(d)),
                },
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest { message, .. } => write!(f, "Bad Request: {message}"),
            Self::NotFound { message, .. } => write!(f, "Not Found: {message}"),
            Self::Unprocessable { message, .. } => {
                write!(f, "Unprocessable Entity: {message}")
            }
            Self::InternalError { message, .. } => {
                write!(f, "Internal Error: {message}")
            }
            Self::BadGateway { message, .. } => write!(f, "Bad Gateway: {message}"),
            Self::ServiceUnavailable { message, .. } => {
                write!(f, "Service Unavailable: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Convert from rastro_core errors.
impl From<rastro_core::RastroError> for ApiError {
    fn from(err: rastro_core::RastroError) -> Self {
        use rastro_core::RastroError;

        let error_code = err.error_code().to_string();
        match &err {
            RastroError::AdapterNotFound
            | RastroError::AdapterPoweredOff
            | RastroError::ScanPermissionDenied(_)
            | RastroError::ActivationFailed(_) => Self::ServiceUnavailable {
                error_code,
                message: err.to_string(),
                details: None,
            },
            RastroError::LocationUnavailable(_) | RastroError::AdvisoryFailed(_) => {
                Self::BadGateway {
                    error_code,
                    message: err.to_string(),
                }
            }
            RastroError::ConfigNotFound(_) => Self::NotFound {
                error_code,
                message: err.to_string(),
            },
            RastroError::ConfigParseError(_) | RastroError::ConfigValidationError(_) => {
                Self::Unprocessable {
                    error_code,
                    message: err.to_string(),
                }
            }
            RastroError::IoError(_) => Self::InternalError {
                error_code,
                message: err.to_string(),
                details: None,
            },
        }
    }
}

impl From<rastro_core::SourceError> for ApiError {
    fn from(err: rastro_core::SourceError) -> Self {
        Self::from(rastro_core::RastroError::from(err))
    }
}

impl From<rastro_core::ConfigError> for ApiError {
    fn from(err: rastro_core::ConfigError) -> Self {
        Self::from(rastro_core::RastroError::from(err))
    }
}
