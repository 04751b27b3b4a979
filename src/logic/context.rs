//! Scoring Context - artifacts loaded once, shared read-only
//!
//! Encoders and model are bundled into one immutable `Artifacts` value behind
//! an `Arc`. Requests take a snapshot and keep it for their whole
//! `VectorBuilt → Scored → Reported` run; `reload` swaps the pointer.

use std::path::Path;
use std::sync::Arc;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::logic::config::EngineConfig;
use crate::logic::dataset::read_path;
use crate::logic::encoder::EncoderStore;
use crate::logic::features::{LiveObservation, Protocol, RecordNormalizer, UnknownCategory};
use crate::logic::model::{ClassifierAdapter, ConfusionMatrix, Prediction};

// ============================================================================
// REPORT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanLabel {
    Normal,
    Malicious,
}

impl ScanLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanLabel::Normal => "NORMAL",
            ScanLabel::Malicious => "MALICIOUS",
        }
    }
}

impl From<&Prediction> for ScanLabel {
    fn from(p: &Prediction) -> Self {
        if p.is_attack() {
            ScanLabel::Malicious
        } else {
            ScanLabel::Normal
        }
    }
}

impl std::fmt::Display for ScanLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Result of one live scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub id: String,
    pub label: ScanLabel,
    pub probability: f64,
    pub timestamp: DateTime<Utc>,
    pub protocol: Protocol,
    pub total_bytes: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_categories: Vec<UnknownCategory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded_columns: Vec<String>,
}

impl ScanReport {
    pub fn is_malicious(&self) -> bool {
        self.label == ScanLabel::Malicious
    }

    /// Scored with at least one sentinel-encoded or flat-0 category
    pub fn is_degraded(&self) -> bool {
        !self.unknown_categories.is_empty() || !self.degraded_columns.is_empty()
    }
}

/// Bulk evaluation of a labelled file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub source: String,
    pub scored: usize,
    pub rejected: usize,
    pub rows_with_unknowns: usize,
    pub confusion: ConfusionMatrix,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

// ============================================================================
// ARTIFACTS
// ============================================================================

/// One consistent set of encoders + model
#[derive(Debug)]
pub struct Artifacts {
    pub normalizer: RecordNormalizer,
    pub classifier: ClassifierAdapter,
}

impl Artifacts {
    pub fn load(config: &EngineConfig) -> Result<Self> {
        let encoders = if config.allow_degraded_encoders {
            let (store, missing) = EncoderStore::open_partial(&config.artifact_dir)?;
            if !missing.is_empty() {
                log::warn!("Running with degraded encoders: {:?}", missing);
            }
            store
        } else {
            EncoderStore::open(&config.artifact_dir)?
        };

        let classifier = ClassifierAdapter::load(&config.model_path(), config.attack_threshold)?;
        log::info!(
            "Loaded {} model from {} (threshold {})",
            classifier.metadata().model_type,
            classifier.metadata().model_path,
            config.attack_threshold
        );

        Ok(Self {
            normalizer: RecordNormalizer::new(encoders, config.normalizer()),
            classifier,
        })
    }

    /// Live observation → report, against this exact artifact set
    pub fn score_live(&self, observation: &LiveObservation) -> Result<ScanReport> {
        // VectorBuilt
        let normalized = self.normalizer.normalize_live(observation)?;

        // Scored
        let prediction = self.classifier.score(&normalized.vector).map_err(|e| {
            log::error!("Scoring failed: {}", e);
            e
        })?;

        // Reported
        Ok(ScanReport {
            id: uuid::Uuid::new_v4().to_string(),
            label: ScanLabel::from(&prediction),
            probability: prediction.probability,
            timestamp: Utc::now(),
            protocol: observation.protocol,
            total_bytes: observation.total_bytes(),
            unknown_categories: normalized.unknown_categories,
            degraded_columns: normalized.degraded_columns,
        })
    }

    /// Normalize and score every record of a labelled bulk file
    pub fn evaluate_path(&self, path: &Path) -> Result<EvaluationReport> {
        let read = read_path(path)?;
        let batch = self.normalizer.normalize_bulk(&read.records)?;

        let mut predicted = Vec::with_capacity(batch.len());
        for (vector, line) in batch.vectors.iter().zip(&batch.lines) {
            let prediction = self.classifier.score(vector).map_err(|e| {
                log::error!("Scoring failed at line {}: {}", line, e);
                e
            })?;
            predicted.push(prediction.label);
        }

        let confusion = ConfusionMatrix::from_labels(&batch.labels, &predicted);
        let rejected = read.rejected.len() + batch.rejected.len();
        log::info!(
            "Evaluated {} records from {} ({} rejected, {} with unseen categories)",
            batch.len(),
            path.display(),
            rejected,
            batch.rows_with_unknowns
        );

        Ok(EvaluationReport {
            source: path.display().to_string(),
            scored: batch.len(),
            rejected,
            rows_with_unknowns: batch.rows_with_unknowns,
            accuracy: confusion.accuracy(),
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            confusion,
        })
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

pub struct ScoringContext {
    config: EngineConfig,
    current: RwLock<Arc<Artifacts>>,
}

impl ScoringContext {
    /// Load all artifacts. Missing encoders or model make the service unavailable.
    pub fn load(config: EngineConfig) -> Result<Self> {
        let artifacts = Artifacts::load(&config)?;
        Ok(Self::from_artifacts(config, artifacts))
    }

    pub fn from_artifacts(config: EngineConfig, artifacts: Artifacts) -> Self {
        Self {
            config,
            current: RwLock::new(Arc::new(artifacts)),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Artifacts in effect right now. Held snapshots survive a reload.
    pub fn snapshot(&self) -> Arc<Artifacts> {
        Arc::clone(&self.current.read())
    }

    /// Load a fresh artifact set and swap it in. On error the old set stays.
    pub fn reload(&self) -> Result<()> {
        let fresh = Artifacts::load(&self.config).map_err(|e| {
            log::error!("Artifact reload failed, keeping current set: {}", e);
            e
        })?;

        *self.current.write() = Arc::new(fresh);
        log::info!("Artifacts reloaded from {}", self.config.artifact_dir.display());
        Ok(())
    }

    pub fn score_live(&self, observation: &LiveObservation) -> Result<ScanReport> {
        self.snapshot().score_live(observation)
    }

    pub fn evaluate_path(&self, path: &Path) -> Result<EvaluationReport> {
        self.snapshot().evaluate_path(path)
    }
}

impl std::fmt::Debug for ScoringContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoringContext")
            .field("artifact_dir", &self.config.artifact_dir)
            .field("model", &self.current.read().classifier.metadata().model_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NidsError;
    use crate::logic::features::ConnFlag;
    use crate::logic::fixtures::{fitted_store, syn_flood_forest, TRAIN_ROWS};
    use tempfile::tempdir;

    fn prepared(dir: &Path) -> EngineConfig {
        fitted_store(dir);
        let config = EngineConfig::with_artifact_dir(dir);
        syn_flood_forest().save(&config.model_path()).unwrap();
        config
    }

    fn syn_flood() -> LiveObservation {
        LiveObservation::new(0.0, Protocol::Tcp, ConnFlag::S0, 0.0, 0.0, 300, 1.0).unwrap()
    }

    fn browsing() -> LiveObservation {
        LiveObservation::new(7.0, Protocol::Http, ConnFlag::SF, 850.0, 12000.0, 2, 0.0).unwrap()
    }

    #[test]
    fn test_syn_flood_is_malicious() {
        let dir = tempdir().unwrap();
        let ctx = ScoringContext::load(prepared(dir.path())).unwrap();

        let report = ctx.score_live(&syn_flood()).unwrap();
        assert_eq!(report.label, ScanLabel::Malicious);
        assert!(report.probability > 0.9);
        assert_eq!(report.protocol, Protocol::Tcp);
        assert_eq!(report.total_bytes, 0.0);
        assert!(!report.is_degraded());
    }

    #[test]
    fn test_browsing_is_normal() {
        let dir = tempdir().unwrap();
        let ctx = ScoringContext::load(prepared(dir.path())).unwrap();

        let report = ctx.score_live(&browsing()).unwrap();
        assert_eq!(report.label, ScanLabel::Normal);
        assert!(report.probability < 0.5);
        assert_eq!(report.total_bytes, 12850.0);
        // http is not in the protocol vocabulary
        assert!(report.is_degraded());
    }

    #[test]
    fn test_report_serializes_uppercase_label() {
        let dir = tempdir().unwrap();
        let ctx = ScoringContext::load(prepared(dir.path())).unwrap();
        let report = ctx.score_live(&syn_flood()).unwrap();

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["label"], "MALICIOUS");
        assert_eq!(json["protocol"], "tcp");
        assert!(json.get("unknown_categories").is_none());
    }

    #[test]
    fn test_missing_artifacts_are_unavailable() {
        let dir = tempdir().unwrap();
        let config = EngineConfig::with_artifact_dir(dir.path());
        let err = ScoringContext::load(config.clone()).unwrap_err();
        assert!(err.is_unavailable());

        // Encoders present, model absent
        fitted_store(dir.path());
        let err = ScoringContext::load(config).unwrap_err();
        assert!(matches!(err, NidsError::MissingArtifact { .. }));
    }

    #[test]
    fn test_degraded_mode_loads_without_encoder() {
        let dir = tempdir().unwrap();
        let mut config = prepared(dir.path());
        std::fs::remove_file(dir.path().join("service_encoder.json")).unwrap();

        assert!(ScoringContext::load(config.clone()).is_err());

        config.allow_degraded_encoders = true;
        let ctx = ScoringContext::load(config).unwrap();
        let report = ctx.score_live(&syn_flood()).unwrap();
        assert_eq!(report.degraded_columns, vec!["service".to_string()]);
        assert_eq!(report.label, ScanLabel::Malicious);
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let dir = tempdir().unwrap();
        let config = prepared(dir.path());
        let ctx = ScoringContext::load(config.clone()).unwrap();

        let before = ctx.snapshot();
        ctx.reload().unwrap();
        let after = ctx.snapshot();
        assert!(!Arc::ptr_eq(&before, &after));

        // The old snapshot still scores
        let old = before.score_live(&syn_flood()).unwrap();
        let new = after.score_live(&syn_flood()).unwrap();
        assert_eq!(old.probability, new.probability);
    }

    #[test]
    fn test_failed_reload_keeps_current() {
        let dir = tempdir().unwrap();
        let config = prepared(dir.path());
        let ctx = ScoringContext::load(config.clone()).unwrap();
        let before = ctx.snapshot();

        std::fs::remove_file(config.model_path()).unwrap();
        assert!(ctx.reload().is_err());
        assert!(Arc::ptr_eq(&before, &ctx.snapshot()));
        assert!(ctx.score_live(&syn_flood()).is_ok());
    }

    #[test]
    fn test_evaluate_path() {
        let dir = tempdir().unwrap();
        let ctx = ScoringContext::load(prepared(dir.path())).unwrap();

        let data = dir.path().join("test.txt");
        let contents = format!("{}0,tcp,too,short\n", TRAIN_ROWS);
        std::fs::write(&data, contents).unwrap();

        let report = ctx.evaluate_path(&data).unwrap();
        assert_eq!(report.scored, 5);
        assert_eq!(report.rejected, 1);
        assert_eq!(report.rows_with_unknowns, 0);
        assert_eq!(report.confusion.total(), 5);
        // neptune row: serror 1.0 / srv_serror 1.0 → attack
        assert!(report.confusion.true_positive >= 1);
    }
}
