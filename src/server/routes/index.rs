//! Upload page and HTML result page

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::Html;
use tracing::{debug, info};

use super::{extract_file, run_prediction};
use crate::server::error::{ApiError, NO_FILE_PART};
use crate::server::state::SharedState;
use crate::templates::{render_index, render_result};

/// GET / - Upload form
pub async fn index_page() -> Html<String> {
    Html(render_index())
}

/// POST / - Classify an uploaded image and render the result page
pub async fn upload_and_predict(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Html<String>, ApiError> {
    let multipart = multipart.map_err(|e| {
        debug!("Rejected non-multipart upload: {}", e);
        ApiError::bad_request(NO_FILE_PART)
    })?;
    let upload = extract_file(multipart).await?;

    // Classify before writing so undecodable files never reach the upload dir
    let prediction = run_prediction(&state, upload.bytes.clone()).await?;
    let stored = state.uploads.save(&upload.filename, &upload.bytes).await?;

    info!(
        "{} -> {} ({}%)",
        stored.filename,
        prediction.class_name,
        prediction.confidence_label()
    );

    Ok(Html(render_result(
        &prediction.display_name,
        &prediction.class_name,
        &prediction.confidence_label(),
        &stored.filename,
    )))
}
