//! Static assets compiled into the binary

use axum::http::header;
use axum::response::IntoResponse;

use crate::templates::UPLOAD_SCRIPT;

/// GET /static/script.js - Upload page script
pub async fn upload_script() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        UPLOAD_SCRIPT,
    )
}
