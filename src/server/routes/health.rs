//! Health check endpoint

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::server::state::SharedState;

/// Loaded model summary
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelInfo {
    pub input_shape: Vec<usize>,
    pub num_classes: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub version: String,
    pub model: ModelInfo,
}

/// GET /health - Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        started_at: state.started_at,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: ModelInfo {
            input_shape: state.predictor.input_shape().to_vec(),
            num_classes: state.predictor.classes().len(),
        },
    })
}
