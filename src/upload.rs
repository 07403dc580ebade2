//! Upload validation and storage
//!
//! Uploaded images are written to a single flat directory and served back by
//! file name on the result page.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::utils::error::{DiagnosisError, Result};

/// Extensions accepted for upload (lowercase)
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Check that a file name carries an allowed image extension
pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reduce a client-supplied file name to a safe flat name.
///
/// Keeps the last path component, maps characters outside `[A-Za-z0-9._-]`
/// to `_` and strips leading dots. Returns `None` if nothing usable remains.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_' || c == '.') {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// MIME type for a stored upload
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// A file written to the upload directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Name under which the file is served (`/uploads/{filename}`)
    pub filename: String,
    /// Location on disk
    pub path: PathBuf,
}

/// Flat directory of uploaded images
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    unique_names: bool,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, unique_names: bool) -> Self {
        Self {
            dir: dir.into(),
            unique_names,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it does not exist
    pub async fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Validate and write an upload, returning the stored name
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredUpload> {
        if !allowed_file(original_name) {
            return Err(DiagnosisError::Upload(format!(
                "file type not allowed: {}",
                original_name
            )));
        }

        let safe = sanitize_filename(original_name).ok_or_else(|| {
            DiagnosisError::Upload(format!("unusable file name: {}", original_name))
        })?;
        let filename = if self.unique_names {
            format!("{}_{}", Uuid::new_v4().simple(), safe)
        } else {
            safe
        };

        let path = self.dir.join(&filename);
        fs::write(&path, bytes).await?;
        debug!("Stored upload {:?} ({} bytes)", path, bytes.len());

        Ok(StoredUpload { filename, path })
    }

    /// Path of a stored upload for serving
    pub async fn resolve(&self, filename: &str) -> Result<PathBuf> {
        if sanitize_filename(filename).as_deref() != Some(filename) {
            return Err(DiagnosisError::InvalidInput(format!(
                "invalid upload name: {}",
                filename
            )));
        }

        let path = self.dir.join(filename);
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(DiagnosisError::PathNotFound(path)),
        }
    }
}
