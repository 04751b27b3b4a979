//! Model Module - Classifier inference
//!
//! The classifier is trained elsewhere and loaded read-only. Swapping it is
//! an explicit reload through the scoring context, never a mutation.

pub mod classifier;
pub mod forest;
pub mod metrics;
#[cfg(feature = "onnx")]
pub mod onnx;

// Re-export common types
pub use classifier::{Classifier, ClassifierAdapter, ModelMetadata, Prediction, DEFAULT_ATTACK_THRESHOLD};
pub use forest::{ForestModel, Tree};
pub use metrics::ConfusionMatrix;
