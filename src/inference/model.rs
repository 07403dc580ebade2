//! Model artifact loading (pure Rust ONNX via `tract-onnx`).
//!
//! The network is treated as a black box: a fixed `f32` input tensor goes in,
//! a score vector with one entry per class comes out.

use std::path::Path;

use tract_onnx::prelude::*;
use tracing::info;

use crate::utils::error::{DiagnosisError, Result};

/// Anything that maps a preprocessed image tensor to per-class scores.
pub trait Classifier: Send + Sync {
    /// Input shape including the batch dimension
    fn input_shape(&self) -> &[usize];

    /// Length of the score vector returned by `predict`
    fn num_outputs(&self) -> usize;

    /// Run the model on one flattened input tensor
    fn predict(&self, input: &[f32]) -> Result<Vec<f32>>;

    fn input_len(&self) -> usize {
        self.input_shape().iter().product()
    }
}

/// ONNX model specialised to a fixed input shape
pub struct OnnxClassifier {
    plan: TypedRunnableModel<TypedModel>,
    input_shape: Vec<usize>,
    num_outputs: usize,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("input_shape", &self.input_shape)
            .field("num_outputs", &self.num_outputs)
            .finish()
    }
}

impl OnnxClassifier {
    /// Load an ONNX model and pin its first input to `f32` with `input_shape`.
    pub fn load(path: &Path, input_shape: &[usize]) -> Result<Self> {
        if !path.exists() {
            return Err(DiagnosisError::PathNotFound(path.to_path_buf()));
        }
        if input_shape.is_empty() || input_shape.iter().any(|d| *d == 0) {
            return Err(DiagnosisError::Config(format!(
                "invalid model input shape {:?}",
                input_shape
            )));
        }

        let model = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| DiagnosisError::Model(format!("onnx load failed: {e}")))?;

        let shape: TVec<usize> = input_shape.iter().copied().collect();
        let model = model
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), shape))
            .map_err(|e| DiagnosisError::Model(format!("onnx input fact failed: {e}")))?;

        let plan = model
            .into_optimized()
            .map_err(|e| DiagnosisError::Model(format!("onnx optimize failed: {e}")))?
            .into_runnable()
            .map_err(|e| DiagnosisError::Model(format!("onnx runnable failed: {e}")))?;

        // Run a zero tensor once to learn the output width
        let dummy = tract_ndarray::ArrayD::<f32>::zeros(tract_ndarray::IxDyn(input_shape))
            .into_tvalue();
        let outputs = plan
            .run(tvec!(dummy))
            .map_err(|e| DiagnosisError::Model(format!("onnx warm-up run failed: {e}")))?;
        let num_outputs = first_output(&outputs)
            .map_err(|e| DiagnosisError::Model(e.to_string()))?
            .len();
        if num_outputs == 0 {
            return Err(DiagnosisError::Model("onnx output has zero elements".to_string()));
        }

        info!(
            "Loaded model {:?} (input {:?}, {} outputs)",
            path, input_shape, num_outputs
        );

        Ok(Self {
            plan,
            input_shape: input_shape.to_vec(),
            num_outputs,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn input_shape(&self) -> &[usize] {
        &self.input_shape
    }

    fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    fn predict(&self, input: &[f32]) -> Result<Vec<f32>> {
        let expected = self.input_len();
        if input.len() != expected {
            return Err(DiagnosisError::InvalidInput(format!(
                "model input size mismatch: got {}, expected {} (shape={:?})",
                input.len(),
                expected,
                self.input_shape
            )));
        }

        let tensor = tract_ndarray::ArrayD::<f32>::from_shape_vec(
            tract_ndarray::IxDyn(&self.input_shape),
            input.to_vec(),
        )
        .map_err(|e| DiagnosisError::Inference(format!("input reshape failed: {e}")))?
        .into_tvalue();

        let outputs = self
            .plan
            .run(tvec!(tensor))
            .map_err(|e| DiagnosisError::Inference(format!("onnx run failed: {e}")))?;

        first_output(&outputs)
    }
}

fn first_output(outputs: &TVec<TValue>) -> Result<Vec<f32>> {
    let first = outputs
        .first()
        .ok_or_else(|| DiagnosisError::Inference("onnx produced no outputs".to_string()))?;
    let view = first
        .to_array_view::<f32>()
        .map_err(|e| DiagnosisError::Inference(format!("output decode failed: {e}")))?;
    Ok(view.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `[1, 2, 2, 3]` input -> Flatten -> Gemm -> Softmax over 3 classes.
    /// Class `j` sums channel `j` over all pixels, plus a bias of
    /// `[0.1, 0.0, -0.1]`.
    const TINY_MODEL: &str = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/tests/fixtures/tiny_classifier.onnx"
    );
    const TINY_SHAPE: [usize; 4] = [1, 2, 2, 3];

    fn tiny_classifier() -> OnnxClassifier {
        OnnxClassifier::load(Path::new(TINY_MODEL), &TINY_SHAPE).unwrap()
    }

    /// NHWC tensor with every pixel set to `rgb`
    fn solid(rgb: [f32; 3]) -> Vec<f32> {
        rgb.iter().copied().cycle().take(12).collect()
    }

    #[test]
    fn test_load_detects_output_width() {
        let classifier = tiny_classifier();
        assert_eq!(classifier.input_shape(), &TINY_SHAPE);
        assert_eq!(classifier.input_len(), 12);
        assert_eq!(classifier.num_outputs(), 3);
    }

    #[test]
    fn test_predict_returns_probabilities() {
        let classifier = tiny_classifier();
        let scores = classifier.predict(&solid([0.0, 1.0, 0.0])).unwrap();

        assert_eq!(scores.len(), 3);
        let sum: f32 = scores.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "sum = {sum}");
        assert!(scores.iter().all(|p| (0.0..=1.0).contains(p)));

        // logits [0.1, 4.0, -0.1]
        assert!(scores[1] > 0.96 && scores[1] < 0.97, "scores = {scores:?}");
        assert!(scores[0] > scores[2]);
    }

    #[test]
    fn test_predict_follows_bias_on_zero_input() {
        let classifier = tiny_classifier();
        let scores = classifier.predict(&solid([0.0, 0.0, 0.0])).unwrap();
        assert!(scores[0] > scores[1] && scores[1] > scores[2]);
    }

    #[test]
    fn test_predict_rejects_wrong_input_length() {
        let classifier = tiny_classifier();
        let err = classifier.predict(&[0.0; 11]).unwrap_err();
        assert!(matches!(err, DiagnosisError::InvalidInput(_)));
    }

    #[test]
    fn test_load_missing_model() {
        let err = OnnxClassifier::load(Path::new("/nonexistent/model.onnx"), &[1, 224, 224, 3])
            .unwrap_err();
        assert!(matches!(err, DiagnosisError::PathNotFound(_)));
    }

    #[test]
    fn test_load_rejects_zero_dimension() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = OnnxClassifier::load(file.path(), &[1, 0, 224, 3]).unwrap_err();
        assert!(matches!(err, DiagnosisError::Config(_)));
    }

    #[test]
    fn test_load_rejects_non_onnx_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"not a protobuf").unwrap();
        let err = OnnxClassifier::load(file.path(), &[1, 224, 224, 3]).unwrap_err();
        assert!(matches!(err, DiagnosisError::Model(_)));
    }
}
