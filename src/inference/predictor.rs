//! Inference Predictor Module
//!
//! Ties preprocessing, the model and the class list together: one image in,
//! one [`Prediction`] out.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::model::Classifier;
use super::preprocess::ImagePreprocessor;
use crate::classes::{display_name, is_healthy, ClassNames};
use crate::utils::error::{DiagnosisError, Result};

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max_val = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp_vals: Vec<f32> = logits.iter().map(|&x| (x - max_val).exp()).collect();
    let sum_exp: f32 = exp_vals.iter().sum();
    exp_vals.into_iter().map(|v| v / sum_exp).collect()
}

/// Index and value of the largest score; the first maximum wins.
pub fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .fold(None, |best, (i, v)| match best {
            Some((_, best_val)) if best_val >= v => best,
            _ => Some((i, v)),
        })
}

/// A single class with its score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    pub class_index: usize,
    pub label: String,
    pub display_name: String,
    pub score: f32,
}

/// Result of a single prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted class index (argmax of the output vector)
    pub class_index: usize,

    /// Raw label from the class list
    pub class_name: String,

    /// Human-readable label
    pub display_name: String,

    /// Score of the predicted class, 0..1
    pub confidence: f32,

    /// Whether the predicted class is a healthy leaf
    pub healthy: bool,

    /// Highest scoring classes, best first
    pub top_k: Vec<ClassScore>,

    /// Model time in milliseconds (preprocessing excluded)
    pub inference_time_ms: f64,
}

impl Prediction {
    /// Build a prediction from a probability vector
    pub fn from_scores(
        scores: &[f32],
        classes: &ClassNames,
        top_k: usize,
        inference_time: Duration,
    ) -> Result<Self> {
        let (class_index, confidence) = argmax(scores).ok_or_else(|| {
            DiagnosisError::Inference("model returned no usable scores".to_string())
        })?;
        let class_name = label_for(classes, class_index)?;

        let mut indexed: Vec<(usize, f32)> = scores
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, p)| !p.is_nan())
            .collect();
        indexed.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        let top_k = indexed
            .into_iter()
            .take(top_k)
            .map(|(idx, score)| {
                let label = label_for(classes, idx)?;
                Ok(ClassScore {
                    class_index: idx,
                    display_name: display_name(&label),
                    label,
                    score,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            class_index,
            display_name: display_name(&class_name),
            healthy: is_healthy(&class_name),
            class_name,
            confidence,
            top_k,
            inference_time_ms: inference_time.as_secs_f64() * 1000.0,
        })
    }

    /// Confidence as a percentage
    pub fn confidence_percent(&self) -> f32 {
        self.confidence * 100.0
    }

    /// Confidence percentage with two decimals, e.g. `"97.31"`
    pub fn confidence_label(&self) -> String {
        format!("{:.2}", self.confidence_percent())
    }

    /// Pretty print the prediction result
    pub fn display(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "Prediction: {} (class {})\n",
            self.display_name, self.class_index
        ));
        output.push_str(&format!("Confidence: {}%\n", self.confidence_label()));
        output.push_str(&format!("Inference time: {:.2} ms\n", self.inference_time_ms));

        if self.top_k.len() > 1 {
            output.push_str(&format!("\nTop-{} predictions:\n", self.top_k.len()));
            for (i, score) in self.top_k.iter().enumerate() {
                output.push_str(&format!(
                    "  {}. {} - {:.2}%\n",
                    i + 1,
                    score.display_name,
                    score.score * 100.0
                ));
            }
        }

        output
    }
}

fn label_for(classes: &ClassNames, index: usize) -> Result<String> {
    classes.get(index).map(str::to_string).ok_or_else(|| {
        DiagnosisError::Inference(format!(
            "class index {} out of range ({} classes)",
            index,
            classes.len()
        ))
    })
}

/// Predictor running the full preprocess -> model -> argmax pipeline
#[derive(Clone)]
pub struct Predictor {
    preprocessor: ImagePreprocessor,
    classifier: Arc<dyn Classifier>,
    classes: ClassNames,
    /// Apply softmax to raw model outputs (for models that emit logits)
    apply_softmax: bool,
    /// Number of entries kept in `Prediction::top_k`
    top_k: usize,
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor")
            .field("input_shape", &self.classifier.input_shape())
            .field("num_classes", &self.classes.len())
            .field("apply_softmax", &self.apply_softmax)
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl Predictor {
    /// Create a predictor, checking that model and class list agree
    pub fn new(
        preprocessor: ImagePreprocessor,
        classifier: Arc<dyn Classifier>,
        classes: ClassNames,
    ) -> Result<Self> {
        if classifier.input_shape() != preprocessor.input_shape().as_slice() {
            return Err(DiagnosisError::Config(format!(
                "model expects input {:?} but preprocessing produces {:?}",
                classifier.input_shape(),
                preprocessor.input_shape()
            )));
        }
        if classifier.num_outputs() != classes.len() {
            return Err(DiagnosisError::Config(format!(
                "model has {} outputs but {} class names were loaded",
                classifier.num_outputs(),
                classes.len()
            )));
        }

        Ok(Self {
            preprocessor,
            classifier,
            classes,
            apply_softmax: false,
            top_k: 1,
        })
    }

    /// Configure softmax on model outputs
    pub fn with_softmax(mut self, apply_softmax: bool) -> Self {
        self.apply_softmax = apply_softmax;
        self
    }

    /// Configure how many classes are reported
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    pub fn classes(&self) -> &ClassNames {
        &self.classes
    }

    pub fn input_shape(&self) -> &[usize] {
        self.classifier.input_shape()
    }

    /// Predict on a preprocessed tensor
    pub fn predict_tensor(&self, tensor: &[f32]) -> Result<Prediction> {
        let start = Instant::now();
        let raw = self.classifier.predict(tensor)?;
        let inference_time = start.elapsed();

        if raw.is_empty() {
            return Err(DiagnosisError::Inference("model returned an empty output".to_string()));
        }

        let scores = if self.apply_softmax { softmax(&raw) } else { raw };
        let prediction = Prediction::from_scores(&scores, &self.classes, self.top_k, inference_time)?;

        debug!(
            "Predicted {} ({}%) in {:.2} ms",
            prediction.class_name,
            prediction.confidence_label(),
            prediction.inference_time_ms
        );
        Ok(prediction)
    }

    /// Predict on a decoded image
    pub fn predict_image(&self, image: &DynamicImage) -> Result<Prediction> {
        let tensor = self.preprocessor.preprocess(image);
        self.predict_tensor(&tensor)
    }

    /// Predict on encoded image bytes (PNG, JPEG)
    pub fn predict_bytes(&self, bytes: &[u8]) -> Result<Prediction> {
        let tensor = self.preprocessor.preprocess_bytes(bytes)?;
        self.predict_tensor(&tensor)
    }

    /// Predict on an image file
    pub fn predict_file(&self, path: &Path) -> Result<Prediction> {
        let tensor = self.preprocessor.preprocess_file(path)?;
        self.predict_tensor(&tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::preprocess::PreprocessConfig;

    /// Returns a fixed score vector regardless of input
    struct FixedClassifier {
        shape: Vec<usize>,
        scores: Vec<f32>,
    }

    impl Classifier for FixedClassifier {
        fn input_shape(&self) -> &[usize] {
            &self.shape
        }
        fn num_outputs(&self) -> usize {
            self.scores.len()
        }
        fn predict(&self, input: &[f32]) -> Result<Vec<f32>> {
            assert_eq!(input.len(), self.input_len());
            Ok(self.scores.clone())
        }
    }

    fn classes() -> ClassNames {
        ClassNames::new(vec![
            "Tomato___Bacterial_spot".to_string(),
            "Tomato___Late_blight".to_string(),
            "Tomato___healthy".to_string(),
        ])
    }

    fn small_preprocessor() -> ImagePreprocessor {
        ImagePreprocessor::new(PreprocessConfig {
            width: 8,
            height: 8,
            ..Default::default()
        })
    }

    fn predictor(scores: Vec<f32>) -> Predictor {
        let classifier = FixedClassifier {
            shape: vec![1, 8, 8, 3],
            scores,
        };
        Predictor::new(small_preprocessor(), Arc::new(classifier), classes()).unwrap()
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_large_values() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_argmax() {
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some((1, 0.7)));
        assert_eq!(argmax(&[0.5, 0.5]), Some((0, 0.5)));
        assert_eq!(argmax(&[f32::NAN, 0.3]), Some((1, 0.3)));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_prediction_from_scores() {
        let prediction =
            Prediction::from_scores(&[0.05, 0.9, 0.05], &classes(), 2, Duration::from_millis(12))
                .unwrap();

        assert_eq!(prediction.class_index, 1);
        assert_eq!(prediction.class_name, "Tomato___Late_blight");
        assert_eq!(prediction.display_name, "Tomato - Late blight");
        assert!(!prediction.healthy);
        assert_eq!(prediction.confidence_label(), "90.00");
        assert_eq!(prediction.top_k.len(), 2);
        assert_eq!(prediction.top_k[0].class_index, 1);
        assert_eq!(prediction.top_k[1].class_index, 0);
    }

    #[test]
    fn test_confidence_label_rounds() {
        let prediction =
            Prediction::from_scores(&[0.973_14, 0.02, 0.006_86], &classes(), 1, Duration::ZERO)
                .unwrap();
        assert_eq!(prediction.confidence_label(), "97.31");
    }

    #[test]
    fn test_predict_image() {
        let predictor = predictor(vec![0.1, 0.1, 0.8]);
        let image = DynamicImage::new_rgb8(32, 16);
        let prediction = predictor.predict_image(&image).unwrap();
        assert_eq!(prediction.class_name, "Tomato___healthy");
        assert!(prediction.healthy);
    }

    #[test]
    fn test_predict_with_softmax() {
        let predictor = predictor(vec![0.0, 5.0, 0.0]).with_softmax(true).with_top_k(3);
        let prediction = predictor.predict_image(&DynamicImage::new_rgb8(8, 8)).unwrap();
        assert_eq!(prediction.class_index, 1);
        assert!(prediction.confidence < 1.0 && prediction.confidence > 0.9);
        assert_eq!(prediction.top_k.len(), 3);
    }

    #[test]
    fn test_class_count_mismatch() {
        let classifier = FixedClassifier {
            shape: vec![1, 8, 8, 3],
            scores: vec![0.5, 0.5],
        };
        let err = Predictor::new(small_preprocessor(), Arc::new(classifier), classes()).unwrap_err();
        assert!(matches!(err, DiagnosisError::Config(_)));
    }

    #[test]
    fn test_input_shape_mismatch() {
        let classifier = FixedClassifier {
            shape: vec![1, 3, 8, 8],
            scores: vec![0.2, 0.3, 0.5],
        };
        let err = Predictor::new(small_preprocessor(), Arc::new(classifier), classes()).unwrap_err();
        assert!(err.to_string().contains("preprocessing"));
    }

    #[test]
    fn test_predict_bytes_invalid() {
        let predictor = predictor(vec![0.2, 0.3, 0.5]);
        let err = predictor.predict_bytes(b"garbage").unwrap_err();
        assert!(matches!(err, DiagnosisError::InvalidImage(_)));
    }
}
