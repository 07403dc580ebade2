//! JSON prediction endpoint used by script-driven front-ends

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{extract_file, run_prediction};
use crate::inference::ClassScore;
use crate::server::error::{ApiError, NOT_A_LEAF, NO_FILE_PART};
use crate::server::state::SharedState;

/// Response for a successful prediction
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Human-readable class name
    pub predicted_class: String,
    pub class_index: usize,
    /// Formatted percentage, e.g. `"97.31%"`
    pub confidence: String,
    /// Raw score, 0..1
    pub confidence_value: f32,
    pub healthy: bool,
    pub top_k: Vec<ClassScore>,
    /// Stored upload, served at `/uploads/{image_file}`
    pub image_file: String,
    pub inference_time_ms: f64,
}

/// POST /predict - Classify an uploaded image and return JSON
pub async fn predict_json(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let multipart = multipart.map_err(|_| ApiError::bad_request(NO_FILE_PART).into_json())?;
    let upload = extract_file(multipart).await.map_err(ApiError::into_json)?;

    let prediction = run_prediction(&state, upload.bytes.clone())
        .await
        .map_err(ApiError::into_json)?;

    if let Some(min) = state.config.min_confidence {
        if prediction.confidence < min {
            info!(
                "Rejected {}: top score {}% below threshold",
                upload.filename,
                prediction.confidence_label()
            );
            return Err(ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, NOT_A_LEAF).into_json());
        }
    }

    let stored = state
        .uploads
        .save(&upload.filename, &upload.bytes)
        .await
        .map_err(|e| ApiError::from(e).into_json())?;

    info!(
        "{} -> {} ({}%)",
        stored.filename,
        prediction.class_name,
        prediction.confidence_label()
    );

    Ok(Json(PredictResponse {
        confidence: format!("{}%", prediction.confidence_label()),
        predicted_class: prediction.display_name,
        class_index: prediction.class_index,
        confidence_value: prediction.confidence,
        healthy: prediction.healthy,
        top_k: prediction.top_k,
        image_file: stored.filename,
        inference_time_ms: prediction.inference_time_ms,
    }))
}
