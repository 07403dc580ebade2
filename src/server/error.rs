//! HTTP error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::utils::error::DiagnosisError;

pub const NO_FILE_PART: &str = "No file part in the request.";
pub const NO_FILE_SELECTED: &str = "No file selected.";
pub const INVALID_FILE_TYPE: &str = "Invalid file type.";
pub const INVALID_IMAGE: &str = "Invalid image file.";
pub const FILE_NOT_FOUND: &str = "File not found";
pub const NOT_A_LEAF: &str =
    "Could not recognise a leaf in this image. Please upload a clear photo of a single leaf.";

/// Body of JSON error responses
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// An error that renders as an HTTP response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Render as `{"error": ...}` instead of plain text
    pub json: bool,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            json: false,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    }

    /// Switch to a JSON body
    pub fn into_json(mut self) -> Self {
        self.json = true;
        self
    }
}

impl From<DiagnosisError> for ApiError {
    fn from(err: DiagnosisError) -> Self {
        match err {
            DiagnosisError::InvalidImage(_) | DiagnosisError::ImageLoad(..) => {
                ApiError::bad_request(INVALID_IMAGE)
            }
            DiagnosisError::Upload(_) => ApiError::bad_request(INVALID_FILE_TYPE),
            DiagnosisError::InvalidInput(msg) => ApiError::bad_request(msg),
            DiagnosisError::PathNotFound(_) => ApiError::new(StatusCode::NOT_FOUND, FILE_NOT_FOUND),
            other => {
                error!("Request failed: {}", other);
                ApiError::internal()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.json {
            (self.status, Json(ErrorBody { error: self.message })).into_response()
        } else {
            (self.status, self.message).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_status_mapping() {
        let err: ApiError = DiagnosisError::InvalidImage("bad".to_string()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, INVALID_IMAGE);

        let err: ApiError = DiagnosisError::PathNotFound(PathBuf::from("x.png")).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        let err: ApiError = DiagnosisError::Inference("boom".to_string()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("boom"));
    }

    #[test]
    fn test_json_flag() {
        let err = ApiError::bad_request(NO_FILE_SELECTED).into_json();
        assert!(err.json);
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
