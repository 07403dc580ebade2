//! HTTP front-end
//!
//! | Route                   | Handler                          |
//! |-------------------------|----------------------------------|
//! | `GET /`                 | upload form                      |
//! | `POST /`                | upload, classify, HTML result    |
//! | `POST /predict`         | upload, classify, JSON result    |
//! | `GET /uploads/:file`    | stored upload                    |
//! | `GET /static/script.js` | upload page script               |
//! | `GET /health`           | liveness and model summary       |

pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::ApiError;
pub use state::{load_predictor, AppState, SharedState};

use crate::templates::UPLOAD_SCRIPT_PATH;
use crate::utils::error::Result;

/// Build the application router
pub fn build_router(state: SharedState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route(
            "/",
            get(routes::index::index_page).post(routes::index::upload_and_predict),
        )
        .route("/predict", post(routes::predict::predict_json))
        .route("/uploads/:filename", get(routes::uploads::serve_upload))
        .route(UPLOAD_SCRIPT_PATH, get(routes::assets::upload_script))
        .route("/health", get(routes::health::health_check))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Bind and serve until Ctrl-C
pub async fn serve(state: SharedState, addr: SocketAddr) -> Result<()> {
    state.uploads.ensure_dir().await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting server on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
