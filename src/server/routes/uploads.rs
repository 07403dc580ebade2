//! Serving stored uploads

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::error;

use crate::server::error::ApiError;
use crate::server::state::SharedState;
use crate::upload::content_type_for;

/// GET /uploads/:filename - Serve an uploaded image
pub async fn serve_upload(
    State(state): State<SharedState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let path = state.uploads.resolve(&filename).await?;

    let file = fs::File::open(&path).await.map_err(|e| {
        error!("Failed to open upload {:?}: {}", path, e);
        ApiError::internal()
    })?;

    let body = Body::from_stream(ReaderStream::new(file));

    Ok(([(header::CONTENT_TYPE, content_type_for(&path))], body))
}
