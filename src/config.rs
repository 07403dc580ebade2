//! Server configuration
//!
//! Defaults can be overridden from a TOML file, which in turn is overridden by
//! command line flags and environment variables in `main`.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::inference::PreprocessConfig;
use crate::utils::error::{DiagnosisError, Result};

/// Default cap on request bodies (16 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// ONNX model artifact
    pub model_path: PathBuf,
    /// Class names, one per line, in model output order
    pub class_names_path: PathBuf,
    /// Directory uploaded images are written to
    pub upload_dir: PathBuf,
    /// Maximum accepted request body size in bytes
    pub max_upload_bytes: usize,
    /// Prefix stored uploads with a random id
    pub unique_filenames: bool,
    /// Apply softmax to model outputs (models exporting logits)
    pub apply_softmax: bool,
    /// Number of classes reported by the JSON endpoint
    pub top_k: usize,
    /// Reject JSON predictions scoring below this (0..1)
    pub min_confidence: Option<f32>,
    /// Image preprocessing
    pub preprocess: PreprocessConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            model_path: PathBuf::from("tomato_disease_recognizer.onnx"),
            class_names_path: PathBuf::from("class_names.txt"),
            upload_dir: PathBuf::from("static/uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            unique_filenames: true,
            apply_softmax: false,
            top_k: 3,
            min_confidence: None,
            preprocess: PreprocessConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load a configuration file; missing keys take their default value
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DiagnosisError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;

        toml::from_str(&content).map_err(|e| {
            DiagnosisError::Config(format!("Failed to parse config {}: {e}", path.display()))
        })
    }

    /// Socket address built from host and port
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| DiagnosisError::Config(format!("invalid listen address: {e}")))
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(DiagnosisError::Config("port must be non-zero".to_string()));
        }
        if self.preprocess.width == 0 || self.preprocess.height == 0 {
            return Err(DiagnosisError::Config(
                "preprocess width and height must be non-zero".to_string(),
            ));
        }
        if self.top_k == 0 {
            return Err(DiagnosisError::Config("top_k must be at least 1".to_string()));
        }
        if self.max_upload_bytes == 0 {
            return Err(DiagnosisError::Config(
                "max_upload_bytes must be non-zero".to_string(),
            ));
        }
        if let Some(min) = self.min_confidence {
            if !(0.0..=1.0).contains(&min) {
                return Err(DiagnosisError::Config(format!(
                    "min_confidence must be within 0..1, got {min}"
                )));
            }
        }
        Ok(())
    }
}
