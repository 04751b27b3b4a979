//! Classifier Adapter - wraps the externally trained ensemble
//!
//! The model is opaque: anything implementing `Classifier` that returns an
//! attack probability for a schema-length vector. Label and probability
//! always come from the same scoring pass.

use std::path::Path;
use serde::{Deserialize, Serialize};

use super::forest::ForestModel;
use crate::error::{ArtifactKind, NidsError, Result};
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

pub use crate::constants::DEFAULT_ATTACK_THRESHOLD;

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Trait for scoring backends (native forest, ONNX, ...)
pub trait Classifier: Send + Sync {
    fn kind(&self) -> &'static str;

    /// Number of input features the backend was trained on
    fn n_features(&self) -> usize;

    /// Probability of the attack class for one vector of `n_features()` values
    fn attack_probability(&self, features: &[f32]) -> Result<f64>;

    /// Structural check run once when the adapter is built
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl Classifier for ForestModel {
    fn kind(&self) -> &'static str {
        "forest"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn attack_probability(&self, features: &[f32]) -> Result<f64> {
        self.predict_proba(features)
    }

    fn validate(&self) -> Result<()> {
        ForestModel::validate(self)
    }
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// 0 = normal, 1 = attack
    pub label: u8,
    /// Probability of attack, in [0, 1]
    pub probability: f64,
}

impl Prediction {
    pub fn is_attack(&self) -> bool {
        self.label == 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_path: String,
    pub model_type: String,
    pub features: usize,
    pub threshold: f64,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

// ============================================================================
// ADAPTER
// ============================================================================

pub struct ClassifierAdapter {
    model: Box<dyn Classifier>,
    threshold: f64,
    metadata: ModelMetadata,
}

impl std::fmt::Debug for ClassifierAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierAdapter")
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl ClassifierAdapter {
    pub fn new(model: Box<dyn Classifier>, threshold: f64, source: &str) -> Result<Self> {
        model.validate()?;
        if model.n_features() != FEATURE_COUNT {
            return Err(NidsError::invalid_model(format!(
                "model expects {} features, schema has {}",
                model.n_features(),
                FEATURE_COUNT
            )));
        }
        if !(0.0..=1.0).contains(&threshold) {
            return Err(NidsError::invalid_model(format!(
                "attack threshold {} outside [0, 1]",
                threshold
            )));
        }

        let metadata = ModelMetadata {
            model_path: source.to_string(),
            model_type: model.kind().to_string(),
            features: model.n_features(),
            threshold,
            loaded_at: chrono::Utc::now(),
        };

        Ok(Self { model, threshold, metadata })
    }

    /// Load a model artifact; the backend is picked by file extension
    pub fn load(path: &Path, threshold: f64) -> Result<Self> {
        if !path.is_file() {
            return Err(NidsError::MissingArtifact {
                kind: ArtifactKind::Model,
                path: path.to_path_buf(),
            });
        }

        let source = path.display().to_string();
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::new(Box::new(ForestModel::load(path)?), threshold, &source),
            #[cfg(feature = "onnx")]
            Some("onnx") => Self::new(
                Box::new(super::onnx::OnnxClassifier::load(path)?),
                threshold,
                &source,
            ),
            other => Err(NidsError::invalid_model(format!(
                "unsupported model file extension {:?} ({})",
                other, source
            ))),
        }
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Score raw values. Wrong length is fatal for the request.
    pub fn score_values(&self, values: &[f32]) -> Result<Prediction> {
        if values.len() != FEATURE_COUNT {
            return Err(NidsError::ShapeMismatch {
                expected: FEATURE_COUNT,
                got: values.len(),
            });
        }

        let probability = self.model.attack_probability(values)?;
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(NidsError::Inference(format!(
                "{} returned probability {}",
                self.model.kind(),
                probability
            )));
        }

        Ok(Prediction {
            label: u8::from(probability > self.threshold),
            probability,
        })
    }

    pub fn score(&self, vector: &FeatureVector) -> Result<Prediction> {
        vector.validate()?;
        self.score_values(vector.as_slice())
    }

    pub fn predict_label(&self, vector: &FeatureVector) -> Result<u8> {
        Ok(self.score(vector)?.label)
    }

    pub fn predict_probability(&self, vector: &FeatureVector) -> Result<f64> {
        Ok(self.score(vector)?.probability)
    }
}
