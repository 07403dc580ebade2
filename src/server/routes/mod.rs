//! Route handlers and the helpers they share

pub mod assets;
pub mod health;
pub mod index;
pub mod predict;
pub mod uploads;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::Multipart;
use tracing::error;

use crate::inference::Prediction;
use crate::server::error::{ApiError, INVALID_FILE_TYPE, NO_FILE_PART, NO_FILE_SELECTED};
use crate::server::state::SharedState;
use crate::upload::allowed_file;

/// Name of the form field carrying the image
pub const FILE_FIELD: &str = "file";

/// The `file` part of a multipart upload
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

/// Pull the `file` field out of a multipart body and check its name.
pub async fn extract_file(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        // A part without a filename is a plain form value, not a file
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if filename.is_empty() {
            return Err(ApiError::bad_request(NO_FILE_SELECTED));
        }
        if !allowed_file(&filename) {
            return Err(ApiError::bad_request(INVALID_FILE_TYPE));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(e.status(), e.body_text()))?;
        return Ok(UploadedFile { filename, bytes });
    }

    Err(ApiError::bad_request(NO_FILE_PART))
}

/// Run the predictor off the async runtime
pub async fn run_prediction(state: &SharedState, bytes: Bytes) -> Result<Prediction, ApiError> {
    let state = Arc::clone(state);
    tokio::task::spawn_blocking(move || state.predictor.predict_bytes(&bytes))
        .await
        .map_err(|e| {
            error!("Prediction task failed: {}", e);
            ApiError::internal()
        })?
        .map_err(ApiError::from)
}
