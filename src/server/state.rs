//! Application state for the web server
//!
//! Everything here is built once at startup and shared read-only between
//! requests.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::classes::ClassNames;
use crate::config::ServerConfig;
use crate::inference::{ImagePreprocessor, OnnxClassifier, Predictor};
use crate::upload::UploadStore;
use crate::utils::error::Result;

/// Shared application state
#[derive(Debug)]
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Loaded model with its class list
    pub predictor: Predictor,
    /// Upload directory
    pub uploads: UploadStore,
    /// Server start time
    pub started_at: DateTime<Utc>,
    /// Monotonic start time for uptime
    started: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig, predictor: Predictor) -> Self {
        let uploads = UploadStore::new(config.upload_dir.clone(), config.unique_filenames);
        Self {
            config,
            predictor,
            uploads,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Load class names and the model artifact described by `config`
    pub fn load(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        let predictor = load_predictor(&config)?;
        Ok(Self::new(config, predictor))
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

pub type SharedState = Arc<AppState>;

/// Build a predictor from the model and class name paths in `config`
pub fn load_predictor(config: &ServerConfig) -> Result<Predictor> {
    let classes = ClassNames::from_file(&config.class_names_path)?;
    info!("Class names loaded: {:?}", classes.iter().collect::<Vec<_>>());

    let preprocessor = ImagePreprocessor::new(config.preprocess.clone());
    let classifier = OnnxClassifier::load(&config.model_path, &preprocessor.input_shape())?;

    Ok(Predictor::new(preprocessor, Arc::new(classifier), classes)?
        .with_softmax(config.apply_softmax)
        .with_top_k(config.top_k))
}
