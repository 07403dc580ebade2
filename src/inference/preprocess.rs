//! Image preprocessing for model input.
//!
//! Converts an arbitrary decoded image into the flat `f32` tensor the model
//! expects: RGB conversion, resize to a fixed size, then per-pixel
//! normalization in the configured memory layout.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::utils::error::{DiagnosisError, Result};

/// ImageNet normalization mean values (RGB)
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet normalization std values (RGB)
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Default input edge length for ResNet style models
pub const DEFAULT_IMAGE_SIZE: u32 = 224;

/// Pixel value scaling applied after resizing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Scale to [-1, 1]: `x / 127.5 - 1` (Keras ResNetV2 / "tf" mode)
    #[default]
    #[serde(rename = "resnet_v2")]
    ResNetV2,
    /// `(x / 255 - mean) / std` with ImageNet statistics
    #[serde(rename = "imagenet")]
    ImageNet,
    /// Scale to [0, 1]
    Unit,
    /// Leave pixel values in [0, 255]
    Raw,
}

impl Normalization {
    /// Normalize a single channel value
    #[inline]
    pub fn apply(&self, value: u8, channel: usize) -> f32 {
        let v = value as f32;
        match self {
            Normalization::ResNetV2 => v / 127.5 - 1.0,
            Normalization::ImageNet => (v / 255.0 - IMAGENET_MEAN[channel]) / IMAGENET_STD[channel],
            Normalization::Unit => v / 255.0,
            Normalization::Raw => v,
        }
    }
}

/// Memory layout of the input tensor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorLayout {
    /// Batch, height, width, channels (Keras / TensorFlow exports)
    #[default]
    Nhwc,
    /// Batch, channels, height, width (PyTorch exports)
    Nchw,
}

/// Configuration for image preprocessing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Target width in pixels
    pub width: u32,
    /// Target height in pixels
    pub height: u32,
    /// Value scaling
    pub normalization: Normalization,
    /// Tensor memory layout
    pub layout: TensorLayout,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_IMAGE_SIZE,
            height: DEFAULT_IMAGE_SIZE,
            normalization: Normalization::default(),
            layout: TensorLayout::default(),
        }
    }
}

/// Image preprocessor for leaf photos
#[derive(Debug, Clone, Default)]
pub struct ImagePreprocessor {
    config: PreprocessConfig,
}

impl ImagePreprocessor {
    /// Creates a new image preprocessor with the given configuration
    pub fn new(config: PreprocessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Input tensor shape including the batch dimension
    pub fn input_shape(&self) -> [usize; 4] {
        let (w, h) = (self.config.width as usize, self.config.height as usize);
        match self.config.layout {
            TensorLayout::Nhwc => [1, h, w, 3],
            TensorLayout::Nchw => [1, 3, h, w],
        }
    }

    /// Number of values produced for one image
    pub fn tensor_len(&self) -> usize {
        self.input_shape().iter().product()
    }

    /// Preprocesses a decoded image for model input
    pub fn preprocess(&self, image: &DynamicImage) -> Vec<f32> {
        // Drops alpha and expands grayscale
        let rgb = image.to_rgb8();
        let resized = self.resize(rgb);
        self.to_tensor(&resized)
    }

    /// Decodes an in-memory image and preprocesses it
    pub fn preprocess_bytes(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| DiagnosisError::InvalidImage(e.to_string()))?;
        Ok(self.preprocess(&image))
    }

    /// Loads an image from disk and preprocesses it
    pub fn preprocess_file(&self, path: &Path) -> Result<Vec<f32>> {
        let image = image::open(path)
            .map_err(|e| DiagnosisError::ImageLoad(path.to_path_buf(), e.to_string()))?;
        Ok(self.preprocess(&image))
    }

    fn resize(&self, image: RgbImage) -> RgbImage {
        let (width, height) = image.dimensions();
        if width == self.config.width && height == self.config.height {
            return image;
        }

        // Bicubic, aspect ratio not preserved
        imageops::resize(
            &image,
            self.config.width,
            self.config.height,
            FilterType::CatmullRom,
        )
    }

    fn to_tensor(&self, image: &RgbImage) -> Vec<f32> {
        let norm = self.config.normalization;
        let num_pixels = (image.width() * image.height()) as usize;

        match self.config.layout {
            TensorLayout::Nhwc => image
                .pixels()
                .flat_map(|p| (0..3).map(move |c| norm.apply(p[c], c)))
                .collect(),
            TensorLayout::Nchw => {
                let mut data = vec![0.0f32; 3 * num_pixels];
                for (i, pixel) in image.pixels().enumerate() {
                    data[i] = norm.apply(pixel[0], 0);
                    data[num_pixels + i] = norm.apply(pixel[1], 1);
                    data[2 * num_pixels + i] = norm.apply(pixel[2], 2);
                }
                data
            }
        }
    }
}
