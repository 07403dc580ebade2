//! # Leaf Diagnosis
//!
//! A small web front-end for tomato leaf disease recognition. An uploaded
//! photo is resized and normalized, run through a pre-trained ONNX classifier,
//! and the predicted class with its confidence is rendered back as HTML (or
//! JSON for script clients).
//!
//! ## Modules
//!
//! - `classes`: class name list loaded from `class_names.txt`
//! - `inference`: preprocessing, the model artifact and the predictor
//! - `upload`: file name validation and the upload directory
//! - `templates`: the upload and result pages
//! - `server`: axum router, state and handlers
//! - `config`: server configuration
//! - `utils`: logging and error handling
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use leaf_diagnosis::{AppState, ServerConfig};
//!
//! let config = ServerConfig::default();
//! let addr = config.socket_addr()?;
//! let state = std::sync::Arc::new(AppState::load(config)?);
//! leaf_diagnosis::server::serve(state, addr).await?;
//! ```

pub mod classes;
pub mod config;
pub mod inference;
pub mod server;
pub mod templates;
pub mod upload;
pub mod utils;

// Re-export commonly used items for convenience
pub use classes::ClassNames;
pub use config::ServerConfig;
pub use inference::{Classifier, ImagePreprocessor, OnnxClassifier, Prediction, Predictor};
pub use server::{build_router, AppState, SharedState};
pub use upload::UploadStore;
pub use utils::error::{DiagnosisError, Result};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
