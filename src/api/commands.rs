//! Commands - entry points for the CLI (and any other front end)
//!
//! Scan, traffic presets, encoder fitting, evaluation and schema info.
//! Every scoring command goes through an explicitly constructed `Engine`.

use std::path::Path;
use std::str::FromStr;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{NidsError, Result};
use crate::logic::config::EngineConfig;
use crate::logic::context::{EvaluationReport, ScanReport, ScoringContext};
use crate::logic::dataset::read_path;
use crate::logic::encoder::EncoderStore;
use crate::logic::features::layout::{self, CATEGORICAL_ATTRIBUTES, FEATURE_LAYOUT, FEATURE_VERSION};
use crate::logic::features::normalizer::fit_encoders as fit_store;
use crate::logic::features::{ColumnKind, ConnFlag, LiveObservation, ObservationInput, Protocol};
use crate::logic::history::{HistorySummary, HistoryWriter, ScanHistory};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Result of fitting encoders from a training file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitReport {
    pub source: String,
    pub records: usize,
    pub rejected: usize,
    /// attribute → vocabulary size
    pub vocabularies: Vec<(String, usize)>,
    pub artifact_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub position: usize,
    pub name: String,
    pub categorical: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub version: u8,
    pub layout_hash: u32,
    pub feature_count: usize,
    pub columns: Vec<SchemaColumn>,
    pub categorical_attributes: Vec<String>,
}

/// Canned live observations (dashboard "Normal" / "Attack" buttons)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficPreset {
    Normal,
    Attack,
}

impl FromStr for TrafficPreset {
    type Err = NidsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(TrafficPreset::Normal),
            "attack" => Ok(TrafficPreset::Attack),
            other => Err(NidsError::InvalidObservation {
                field: "preset",
                reason: format!("unknown preset '{}', expected normal or attack", other),
            }),
        }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Scoring context plus the scan history of this process
pub struct Engine {
    context: ScoringContext,
    history: Mutex<ScanHistory>,
    writer: Option<HistoryWriter>,
}

impl Engine {
    /// Load artifacts; history stays in memory only
    pub fn open(config: EngineConfig) -> Result<Self> {
        let history = ScanHistory::new(config.history_limit);
        Ok(Self {
            context: ScoringContext::load(config)?,
            history: Mutex::new(history),
            writer: None,
        })
    }

    /// Load artifacts and persist every scan under `config.history_dir`
    pub fn open_persistent(config: EngineConfig) -> Result<Self> {
        let writer = HistoryWriter::new(&config.history_dir)?;
        let mut history = ScanHistory::new(config.history_limit);
        for report in writer.load_all()? {
            history.record(report);
        }
        log::info!(
            "Scan history: {} entries from {}",
            history.len(),
            writer.dir().display()
        );

        Ok(Self {
            context: ScoringContext::load(config)?,
            history: Mutex::new(history),
            writer: Some(writer),
        })
    }

    pub fn context(&self) -> &ScoringContext {
        &self.context
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

/// Validate, normalize, score and record one live observation
pub fn scan(engine: &Engine, input: ObservationInput) -> Result<ScanReport> {
    let observation = LiveObservation::try_from(input)?;
    scan_observation(engine, &observation)
}

pub fn scan_observation(engine: &Engine, observation: &LiveObservation) -> Result<ScanReport> {
    let report = engine.context.score_live(observation)?;

    log::info!(
        "Scan {}: {} (p={:.3}, proto={}, bytes={})",
        report.id,
        report.label,
        report.probability,
        report.protocol,
        report.total_bytes
    );

    if let Some(writer) = &engine.writer {
        // History persistence never fails the scan itself
        if let Err(e) = writer.append(&report) {
            log::warn!("Failed to persist scan {}: {}", report.id, e);
        }
    }
    engine.history.lock().record(report.clone());

    Ok(report)
}

/// Newest first
pub fn get_history(engine: &Engine, limit: usize) -> Vec<ScanReport> {
    engine.history.lock().recent(limit)
}

pub fn get_summary(engine: &Engine) -> HistorySummary {
    engine.history.lock().summary()
}

pub fn clear_history(engine: &Engine) {
    engine.history.lock().clear();
}

/// Swap in freshly written artifacts
pub fn reload_artifacts(engine: &Engine) -> Result<()> {
    engine.context.reload()
}

pub fn evaluate(engine: &Engine, path: &Path) -> Result<EvaluationReport> {
    engine.context.evaluate_path(path)
}

/// Read a training file, fit the three encoders and persist them
pub fn fit_encoders(config: &EngineConfig, path: &Path) -> Result<FitReport> {
    let read = read_path(path)?;
    if read.records.is_empty() {
        return Err(NidsError::MalformedRecord {
            line: 0,
            reason: format!("no valid records in {}", path.display()),
        });
    }

    let mut store = EncoderStore::new(&config.artifact_dir);
    fit_store(&mut store, &read.records)?;

    let vocabularies = CATEGORICAL_ATTRIBUTES
        .iter()
        .filter_map(|a| store.get(a).map(|e| (a.to_string(), e.len())))
        .collect();

    Ok(FitReport {
        source: path.display().to_string(),
        records: read.records.len(),
        rejected: read.rejected.len(),
        vocabularies,
        artifact_dir: config.artifact_dir.display().to_string(),
    })
}

/// Generate a preset observation. `seed` makes it reproducible.
pub fn generate_preset(preset: TrafficPreset, seed: Option<u64>) -> LiveObservation {
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    preset_observation(preset, &mut rng)
}

pub fn preset_observation<R: Rng + ?Sized>(preset: TrafficPreset, rng: &mut R) -> LiveObservation {
    match preset {
        TrafficPreset::Normal => LiveObservation {
            duration: rng.gen_range(0u32..20) as f64,
            protocol: Protocol::Http,
            flag: ConnFlag::SF,
            src_bytes: rng.gen_range(200u32..2000) as f64,
            dst_bytes: rng.gen_range(200u32..50000) as f64,
            count: rng.gen_range(1..10),
            serror_rate: 0.0,
        },
        TrafficPreset::Attack => LiveObservation {
            duration: 0.0,
            protocol: Protocol::Tcp,
            flag: ConnFlag::S0,
            src_bytes: 0.0,
            dst_bytes: 0.0,
            count: rng.gen_range(250..511),
            serror_rate: 1.0,
        },
    }
}

pub fn get_schema() -> SchemaInfo {
    SchemaInfo {
        version: FEATURE_VERSION,
        layout_hash: layout::layout_hash(),
        feature_count: FEATURE_LAYOUT.len(),
        columns: FEATURE_LAYOUT
            .iter()
            .enumerate()
            .map(|(position, (name, kind))| SchemaColumn {
                position,
                name: name.to_string(),
                categorical: *kind == ColumnKind::Categorical,
            })
            .collect(),
        categorical_attributes: CATEGORICAL_ATTRIBUTES.iter().map(|a| a.to_string()).collect(),
    }
}
