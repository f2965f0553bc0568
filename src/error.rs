//! Service error types with HTTP status code mapping.
//!
//! [`MapError`] is the central error type for the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{LayerId, MarkerId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: name is required"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                     |
/// |-----------|-----------------|---------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request / 413           |
/// | 2000–2999 | Not Found       | 404 Not Found                   |
/// | 3000–3999 | Server/Upstream | 500 Internal / 502 Bad Gateway  |
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Uploaded file is not an accepted image type.
    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    /// Upload request carried no file in the expected field.
    #[error("no file uploaded")]
    NoFileUploaded,

    /// Upload request carried more files than allowed.
    #[error("too many files: at most {max} allowed")]
    TooManyFiles {
        /// Maximum number of files per request.
        max: usize,
    },

    /// A single uploaded file exceeds the size limit.
    #[error("file too large: at most {max_bytes} bytes allowed")]
    FileTooLarge {
        /// Maximum accepted size in bytes.
        max_bytes: usize,
    },

    /// Request body exceeds the configured body limit.
    #[error("request body too large")]
    BodyTooLarge,

    /// Layer with the given ID was not found.
    #[error("layer not found: {0}")]
    LayerNotFound(LayerId),

    /// Marker with the given ID was not found.
    #[error("marker not found: {0}")]
    MarkerNotFound(MarkerId),

    /// Geocoder returned no match for the query.
    #[error("address not found: {0}")]
    AddressNotFound(String),

    /// Storage layer failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// HEIC/HEIF to JPEG conversion failed.
    #[error("image conversion failed: {0}")]
    ImageConversion(String),

    /// Upstream geocoding service failure.
    #[error("geocoding failed: {0}")]
    Geocoding(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MapError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::UnsupportedImage(_) => 1002,
            Self::NoFileUploaded => 1003,
            Self::TooManyFiles { .. } => 1004,
            Self::FileTooLarge { .. } => 1005,
            Self::BodyTooLarge => 1006,
            Self::LayerNotFound(_) => 2001,
            Self::MarkerNotFound(_) => 2002,
            Self::AddressNotFound(_) => 2003,
            Self::Internal(_) => 3000,
            Self::Storage(_) => 3001,
            Self::ImageConversion(_) => 3002,
            Self::Geocoding(_) => 3003,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::UnsupportedImage(_)
            | Self::NoFileUploaded
            | Self::TooManyFiles { .. } => StatusCode::BAD_REQUEST,
            Self::FileTooLarge { .. } | Self::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::LayerNotFound(_) | Self::MarkerNotFound(_) | Self::AddressNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Storage(_) | Self::ImageConversion(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Geocoding(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message sent to the client. Server-class errors get a static
    /// message; the detail only goes to the log.
    fn public_message(&self) -> String {
        match self {
            Self::Storage(_) | Self::Internal(_) => "internal server error".to_string(),
            Self::ImageConversion(_) => "failed to convert image".to_string(),
            Self::Geocoding(_) => "geocoding service unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for MapError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.public_message(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

impl From<sqlx::Error> for MapError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<JsonRejection> for MapError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for MapError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for MapError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for MapError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<MultipartError> for MapError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::BodyTooLarge
        } else {
            Self::InvalidRequest(format!("malformed multipart body: {}", err.body_text()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_bad_request() {
        let err = MapError::InvalidRequest("name is required".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), 1001);
        assert_eq!(err.public_message(), "invalid request: name is required");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = MapError::LayerNotFound(LayerId::new());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        let err = MapError::MarkerNotFound(MarkerId::new());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn storage_detail_is_hidden_from_clients() {
        let err = MapError::Storage("connection refused on 10.0.0.3".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "internal server error");
    }

    #[test]
    fn file_too_large_is_413() {
        let err = MapError::FileTooLarge { max_bytes: 10 };
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn response_body_has_code_and_message() {
        let response = MapError::NoFileUploaded.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        let Ok(json) = serde_json::from_slice::<serde_json::Value>(&bytes) else {
            panic!("body is not json");
        };
        assert_eq!(json["error"]["code"], 1003);
        assert_eq!(json["error"]["message"], "no file uploaded");
    }
}
