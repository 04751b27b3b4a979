//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every value can be overridden through an `NIDS_*` environment variable
//! (or a `.env` file, see `EngineConfig::from_env`).

use std::path::PathBuf;

/// Directory holding encoder and model artifacts
pub const DEFAULT_ARTIFACT_DIR: &str = "models";

/// Model artifact file inside the artifact directory
pub const DEFAULT_MODEL_FILE: &str = "forest.json";

/// Attack probability above which a connection is labelled malicious
pub const DEFAULT_ATTACK_THRESHOLD: f64 = 0.5;

/// Live SYN-error rate above which the SYN-flood fill policy applies
pub const DEFAULT_SERROR_FILL_THRESHOLD: f64 = 0.5;

/// Service category assumed for live observations
pub const DEFAULT_UNOBSERVED_SERVICE: &str = "private";

/// Scans kept in the in-memory history
pub const DEFAULT_HISTORY_LIMIT: usize = 500;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Sentinel-NIDS";

// ============================================
// Helper functions to read from env with fallback
// ============================================

pub fn get_artifact_dir() -> PathBuf {
    std::env::var("NIDS_ARTIFACT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_ARTIFACT_DIR))
}

pub fn get_model_file() -> String {
    std::env::var("NIDS_MODEL_FILE")
        .unwrap_or_else(|_| DEFAULT_MODEL_FILE.to_string())
}

pub fn get_attack_threshold() -> f64 {
    std::env::var("NIDS_ATTACK_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_ATTACK_THRESHOLD)
}

pub fn get_serror_fill_threshold() -> f64 {
    std::env::var("NIDS_SERROR_FILL_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SERROR_FILL_THRESHOLD)
}

pub fn get_unobserved_service() -> String {
    std::env::var("NIDS_UNOBSERVED_SERVICE")
        .unwrap_or_else(|_| DEFAULT_UNOBSERVED_SERVICE.to_string())
}

/// Degraded encoders are opt-in
pub fn is_degraded_mode_allowed() -> bool {
    std::env::var("NIDS_ALLOW_DEGRADED")
        .map(|s| s.to_lowercase() == "true" || s == "1")
        .unwrap_or(false)
}

pub fn get_history_dir() -> PathBuf {
    std::env::var("NIDS_HISTORY_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("sentinel-nids")
                .join("history")
        })
}

pub fn get_history_limit() -> usize {
    std::env::var("NIDS_HISTORY_LIMIT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
}
