//! Engine configuration

use std::path::PathBuf;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::logic::features::NormalizerConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory with `<attribute>_encoder.json` and the model file
    pub artifact_dir: PathBuf,
    /// Model file name inside `artifact_dir` (`.json` forest or `.onnx`)
    pub model_file: String,
    pub attack_threshold: f64,
    pub serror_fill_threshold: f64,
    pub unobserved_service: String,
    /// Missing encoders degrade their column to 0 instead of failing
    pub allow_degraded_encoders: bool,
    pub history_dir: PathBuf,
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from(constants::DEFAULT_ARTIFACT_DIR),
            model_file: constants::DEFAULT_MODEL_FILE.to_string(),
            attack_threshold: constants::DEFAULT_ATTACK_THRESHOLD,
            serror_fill_threshold: constants::DEFAULT_SERROR_FILL_THRESHOLD,
            unobserved_service: constants::DEFAULT_UNOBSERVED_SERVICE.to_string(),
            allow_degraded_encoders: false,
            history_dir: constants::get_history_dir(),
            history_limit: constants::DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables (and `.env` if present)
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            artifact_dir: constants::get_artifact_dir(),
            model_file: constants::get_model_file(),
            attack_threshold: constants::get_attack_threshold(),
            serror_fill_threshold: constants::get_serror_fill_threshold(),
            unobserved_service: constants::get_unobserved_service(),
            allow_degraded_encoders: constants::is_degraded_mode_allowed(),
            history_dir: constants::get_history_dir(),
            history_limit: constants::get_history_limit(),
        }
    }

    /// Config rooted at a specific artifact directory, other values default
    pub fn with_artifact_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact_dir: dir.into(),
            ..Default::default()
        }
    }

    pub fn model_path(&self) -> PathBuf {
        self.artifact_dir.join(&self.model_file)
    }

    pub fn normalizer(&self) -> NormalizerConfig {
        NormalizerConfig {
            serror_fill_threshold: self.serror_fill_threshold,
            unobserved_service: self.unobserved_service.clone(),
            allow_degraded_encoders: self.allow_degraded_encoders,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::with_artifact_dir("/tmp/models");
        assert_eq!(config.model_path(), PathBuf::from("/tmp/models/forest.json"));
        assert_eq!(config.attack_threshold, 0.5);
        assert!(!config.allow_degraded_encoders);

        let normalizer = config.normalizer();
        assert_eq!(normalizer.unobserved_service, "private");
        assert_eq!(normalizer.serror_fill_threshold, 0.5);
    }
}
