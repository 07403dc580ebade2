//! Inference module: preprocessing, the model artifact and prediction
//!
//! - `preprocess`: resize/normalize a decoded image into the model's input tensor
//! - `model`: the `Classifier` trait and the ONNX implementation
//! - `predictor`: argmax, class lookup and the end-to-end `Predictor`

pub mod model;
pub mod predictor;
pub mod preprocess;

// Re-export main types for convenience
pub use model::{Classifier, OnnxClassifier};
pub use predictor::{argmax, softmax, ClassScore, Prediction, Predictor};
pub use preprocess::{ImagePreprocessor, Normalization, PreprocessConfig, TensorLayout};
