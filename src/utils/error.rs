//! Error Handling Module
//!
//! Defines the error type shared by the classifier, the upload store and the
//! HTTP layer. Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for leaf diagnosis operations
#[derive(Error, Debug)]
pub enum DiagnosisError {
    /// Error loading an image from disk
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    /// Uploaded bytes could not be decoded as an image
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Error loading or optimizing the model artifact
    #[error("Model error: {0}")]
    Model(String),

    /// Error while running the model
    #[error("Inference error: {0}")]
    Inference(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Rejected upload
    #[error("Upload error: {0}")]
    Upload(String),
}

/// Convenience Result type for leaf diagnosis operations
pub type Result<T> = std::result::Result<T, DiagnosisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DiagnosisError::Model("test error".to_string());
        assert_eq!(format!("{}", err), "Model error: test error");
    }

    #[test]
    fn test_image_load_error() {
        let path = PathBuf::from("/path/to/leaf.jpg");
        let err = DiagnosisError::ImageLoad(path, "file not found".to_string());
        assert!(format!("{}", err).contains("leaf.jpg"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DiagnosisError = io_err.into();
        assert!(matches!(err, DiagnosisError::Io(_)));
    }
}
