//! Record Normalizer - raw records → classifier-ready feature vectors
//!
//! Two entry points:
//! - `normalize_bulk` for complete NSL-KDD rows (training / evaluation)
//! - `normalize_live` for a partial live observation (interactive scoring)
//!
//! Numeric columns are passed through as raw magnitudes. Categorical columns
//! go through the encoder store; unseen values become the unknown sentinel
//! in both modes and the row/request is kept.

use std::collections::{BTreeMap, BTreeSet};
use serde::{Deserialize, Serialize};

use super::layout::{binarize_label, ColumnKind, CATEGORICAL_ATTRIBUTES, FEATURE_COUNT, FEATURE_LAYOUT};
use super::live::{heuristic_fill, FlowShape, LiveObservation};
use super::vector::FeatureVector;
use crate::constants::{DEFAULT_SERROR_FILL_THRESHOLD, DEFAULT_UNOBSERVED_SERVICE};
use crate::error::{NidsError, Result};
use crate::logic::dataset::{RawField, RawRecord, RejectedRecord};
use crate::logic::encoder::{CategoricalEncoder, Encoded, EncoderStore};

// ============================================================================
// OUTPUT TYPES
// ============================================================================

/// A category the encoders have never seen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownCategory {
    pub attribute: String,
    pub value: String,
}

/// One normalized live request
#[derive(Debug, Clone)]
pub struct NormalizedObservation {
    pub vector: FeatureVector,
    pub shape: FlowShape,
    /// Degraded-confidence signal: sentinel-encoded columns
    pub unknown_categories: Vec<UnknownCategory>,
    /// Columns filled with a flat 0 because their encoder is missing
    pub degraded_columns: Vec<String>,
}

impl NormalizedObservation {
    pub fn is_degraded(&self) -> bool {
        !self.unknown_categories.is_empty() || !self.degraded_columns.is_empty()
    }
}

/// Normalized bulk rows. `vectors`, `labels` and `lines` are parallel and in
/// input order.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub vectors: Vec<FeatureVector>,
    pub labels: Vec<u8>,
    pub lines: Vec<u64>,
    pub rows_with_unknowns: usize,
    /// Rows whose shape or field kinds did not match the layout
    pub rejected: Vec<RejectedRecord>,
    /// attribute → unseen value → occurrences
    pub unknown_counts: BTreeMap<String, BTreeMap<String, usize>>,
    pub degraded_columns: Vec<String>,
}

impl NormalizedBatch {
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

// ============================================================================
// NORMALIZER
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    pub serror_fill_threshold: f64,
    pub unobserved_service: String,
    /// Allow a missing encoder to degrade its column to a flat 0
    pub allow_degraded_encoders: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            serror_fill_threshold: DEFAULT_SERROR_FILL_THRESHOLD,
            unobserved_service: DEFAULT_UNOBSERVED_SERVICE.to_string(),
            allow_degraded_encoders: false,
        }
    }
}

enum Column {
    Encoded(Encoded),
    Degraded,
}

/// Per-row scratch; merged into the batch only if the row is accepted
#[derive(Default)]
struct EncodedRow {
    values: Vec<f32>,
    unknowns: Vec<(&'static str, String)>,
    degraded: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub struct RecordNormalizer {
    encoders: EncoderStore,
    config: NormalizerConfig,
}

impl RecordNormalizer {
    pub fn new(encoders: EncoderStore, config: NormalizerConfig) -> Self {
        Self { encoders, config }
    }

    pub fn encoders(&self) -> &EncoderStore {
        &self.encoders
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    fn encode(&self, attribute: &str, value: &str) -> Result<Column> {
        match self.encoders.transform(attribute, value) {
            Ok(encoded) => Ok(Column::Encoded(encoded)),
            Err(NidsError::MissingArtifact { .. }) if self.config.allow_degraded_encoders => {
                Ok(Column::Degraded)
            }
            Err(e) => Err(e),
        }
    }

    /// Complete rows → vectors + binary labels. Row order and count are
    /// preserved; rows with unseen categories are sentinel-encoded, not dropped.
    /// A row whose shape or field kinds do not match the layout is rejected on
    /// its own. Only a missing encoder fails the whole batch.
    pub fn normalize_bulk(&self, records: &[RawRecord]) -> Result<NormalizedBatch> {
        let mut batch = NormalizedBatch {
            vectors: Vec::with_capacity(records.len()),
            labels: Vec::with_capacity(records.len()),
            lines: Vec::with_capacity(records.len()),
            ..Default::default()
        };
        let mut degraded = BTreeSet::new();

        for record in records {
            let mut row = EncodedRow::default();
            match self.encode_record(record, &mut row) {
                Ok(()) => {}
                Err(NidsError::MalformedRecord { line, reason }) => {
                    log::warn!("Rejected bulk record at line {}: {}", line, reason);
                    batch.rejected.push(RejectedRecord { line, reason });
                    continue;
                }
                Err(e) => return Err(e),
            }

            if !row.unknowns.is_empty() {
                batch.rows_with_unknowns += 1;
                log::debug!("Line {}: unseen category, sentinel-encoded", record.line);
            }
            for (attribute, value) in row.unknowns {
                *batch
                    .unknown_counts
                    .entry(attribute.to_string())
                    .or_default()
                    .entry(value)
                    .or_default() += 1;
            }
            degraded.extend(row.degraded);

            batch.vectors.push(FeatureVector::from_vec(row.values)?);
            batch.labels.push(binarize_label(&record.label));
            batch.lines.push(record.line);
        }

        for (attribute, values) in &batch.unknown_counts {
            log::warn!(
                "Unseen '{}' categories (sentinel-encoded): {:?}",
                attribute,
                values
            );
        }

        batch.degraded_columns = degraded.into_iter().map(str::to_string).collect();
        Ok(batch)
    }

    /// Encode one row into `row`. Layout violations are `MalformedRecord`.
    fn encode_record(&self, record: &RawRecord, row: &mut EncodedRow) -> Result<()> {
        let malformed = |reason: String| NidsError::MalformedRecord {
            line: record.line,
            reason,
        };

        if record.fields.len() != FEATURE_COUNT {
            return Err(malformed(format!(
                "expected {} feature fields, got {}",
                FEATURE_COUNT,
                record.fields.len()
            )));
        }

        row.values.reserve(FEATURE_COUNT);
        for (position, ((name, kind), field)) in FEATURE_LAYOUT.iter().zip(&record.fields).enumerate() {
            let value = match (kind, field) {
                (ColumnKind::Numeric, RawField::Number(n)) => {
                    if !n.is_finite() {
                        return Err(malformed(format!("'{}' is not finite: {}", name, n)));
                    }
                    *n
                }
                (ColumnKind::Categorical, RawField::Category(text)) => {
                    match self.encode(name, text)? {
                        Column::Encoded(encoded) => {
                            if !encoded.is_known() {
                                row.unknowns.push((*name, text.clone()));
                            }
                            encoded.as_feature()
                        }
                        Column::Degraded => {
                            row.degraded.push(*name);
                            0.0
                        }
                    }
                }
                (ColumnKind::Categorical, RawField::Number(n)) => {
                    return Err(malformed(format!(
                        "number {} in categorical column {} '{}'",
                        n, position, name
                    )));
                }
                (ColumnKind::Numeric, RawField::Category(text)) => {
                    return Err(malformed(format!(
                        "category {:?} in numeric column {} '{}'",
                        text, position, name
                    )));
                }
            };
            row.values.push(value);
        }

        Ok(())
    }

    /// Partial live observation → full 41-column vector
    pub fn normalize_live(&self, observation: &LiveObservation) -> Result<NormalizedObservation> {
        observation.validate()?;

        // 1. all-zero vector
        let mut vector = FeatureVector::new();

        // 2. directly observed numerics
        vector.set_by_name("duration", observation.duration as f32);
        vector.set_by_name("src_bytes", observation.src_bytes as f32);
        vector.set_by_name("dst_bytes", observation.dst_bytes as f32);
        vector.set_by_name("count", observation.count as f32);
        vector.set_by_name("serror_rate", observation.serror_rate as f32);

        // 3. heuristic completion of the unobserved statistics
        let derived = heuristic_fill(observation.serror_rate, self.config.serror_fill_threshold);
        for (name, value) in &derived.values {
            vector.set_by_name(name, *value);
        }

        // 4. categoricals
        let mut unknown_categories = Vec::new();
        let mut degraded_columns = Vec::new();
        let categories = [
            ("protocol_type", observation.protocol.as_str()),
            ("service", self.config.unobserved_service.as_str()),
            ("flag", observation.flag.as_str()),
        ];

        for (attribute, value) in categories {
            let feature = match self.encode(attribute, value)? {
                Column::Encoded(encoded) => {
                    if !encoded.is_known() {
                        log::warn!(
                            "Unseen {} {:?} - sentinel-encoded, degraded confidence",
                            attribute,
                            value
                        );
                        unknown_categories.push(UnknownCategory {
                            attribute: attribute.to_string(),
                            value: value.to_string(),
                        });
                    }
                    encoded.as_feature()
                }
                Column::Degraded => {
                    log::warn!("No encoder for '{}' - column set to 0 (degraded)", attribute);
                    degraded_columns.push(attribute.to_string());
                    0.0
                }
            };
            vector.set_by_name(attribute, feature);
        }

        Ok(NormalizedObservation {
            vector,
            shape: derived.shape,
            unknown_categories,
            degraded_columns,
        })
    }
}

/// Fit all three encoders from training rows, then persist them together.
/// Nothing is written unless every attribute fits.
pub fn fit_encoders(store: &mut EncoderStore, records: &[RawRecord]) -> Result<()> {
    let encoders = CATEGORICAL_ATTRIBUTES
        .iter()
        .map(|attribute| {
            let values = records
                .iter()
                .filter_map(|r| r.category_by_name(attribute));
            CategoricalEncoder::fit(attribute, values)
        })
        .collect::<Result<Vec<_>>>()?;
    store.install(encoders)
}
