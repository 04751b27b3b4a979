//! ONNX backend - ONNX Runtime Integration
//!
//! For forests exported by the batch job with skl2onnx
//! (`options={"zipmap": False}`): input `float32[N, 41]`, outputs
//! `label` and `probabilities` (`float32[N, 2]`).

use std::path::Path;
use ndarray::Array2;
use parking_lot::Mutex;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Value;

use super::classifier::Classifier;
use crate::error::{ArtifactKind, NidsError, Result};
use crate::logic::features::FEATURE_COUNT;

const PROBABILITY_OUTPUT: &str = "probabilities";

pub struct OnnxClassifier {
    // `Session::run` needs exclusive access
    session: Mutex<Session>,
    output_name: String,
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading ONNX model from: {}", path.display());

        if !path.is_file() {
            return Err(NidsError::MissingArtifact {
                kind: ArtifactKind::Model,
                path: path.to_path_buf(),
            });
        }

        let session = Session::builder()
            .map_err(|e| NidsError::invalid_model(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| NidsError::invalid_model(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(path)
            .map_err(|e| NidsError::invalid_model(format!("Failed to load model: {}", e)))?;

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name == PROBABILITY_OUTPUT)
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .ok_or_else(|| NidsError::invalid_model("No output defined"))?;

        log::info!("ONNX model loaded (probability output '{}')", output_name);

        Ok(Self {
            session: Mutex::new(session),
            output_name,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn kind(&self) -> &'static str {
        "onnx"
    }

    fn n_features(&self) -> usize {
        FEATURE_COUNT
    }

    fn attack_probability(&self, features: &[f32]) -> Result<f64> {
        let input_array = Array2::<f32>::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| NidsError::Inference(format!("Array error: {}", e)))?;

        let input_tensor = Value::from_array(input_array)
            .map_err(|e| NidsError::Inference(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| NidsError::Inference(format!("Inference failed: {}", e)))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| NidsError::Inference("No output".to_string()))?;

        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| NidsError::Inference(format!("Extract error: {}", e)))?;

        // [p(normal), p(attack)]
        data.get(1)
            .map(|p| *p as f64)
            .ok_or_else(|| NidsError::Inference(format!("expected 2 class probabilities, got {}", data.len())))
    }
}
