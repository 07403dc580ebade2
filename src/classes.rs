//! Class name handling
//!
//! The model's output vector is indexed by class; `class_names.txt` holds one
//! label per line in the same order. Labels follow the PlantVillage
//! convention `Plant___Disease` (or `Plant___healthy`).

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::utils::error::{DiagnosisError, Result};

/// Separator between plant and condition in PlantVillage labels
const LABEL_SEPARATOR: &str = "___";

/// Ordered list of class labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassNames {
    names: Vec<String>,
}

impl ClassNames {
    /// Build from an in-memory list
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Load class names from a text file, one label per line.
    ///
    /// Lines are trimmed and blank lines are skipped.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DiagnosisError::PathNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let names = Self::parse(&content);

        if names.is_empty() {
            return Err(DiagnosisError::Config(format!(
                "No class names found in {}",
                path.display()
            )));
        }

        debug!("Loaded {} class names from {:?}", names.len(), path);
        Ok(Self::new(names))
    }

    fn parse(content: &str) -> Vec<String> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get the label for an output index
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Get the output index for a label
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Human-readable form of a label
///
/// `"Tomato___Late_blight"` becomes `"Tomato - Late blight"`.
pub fn display_name(label: &str) -> String {
    match label.split_once(LABEL_SEPARATOR) {
        Some((plant, condition)) => format!(
            "{} - {}",
            plant.replace('_', " ").trim(),
            condition.replace('_', " ").trim()
        ),
        None => label.replace('_', " ").trim().to_string(),
    }
}

/// Check if a label represents a healthy plant (not diseased)
pub fn is_healthy(label: &str) -> bool {
    label.to_lowercase().ends_with("healthy")
}
