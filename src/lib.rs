//! Sentinel-NIDS - NSL-KDD feature normalization and connection scoring
//!
//! Turns raw or partially observed connection records into the 41-column
//! NSL-KDD vector, encodes categoricals with persisted vocabularies and scores
//! the result with an externally trained tree ensemble.

pub mod api;
pub mod constants;
pub mod error;
pub mod logic;

pub use error::{ArtifactKind, NidsError, Result};
pub use logic::config::EngineConfig;
pub use logic::context::{EvaluationReport, ScanLabel, ScanReport, ScoringContext};
pub use logic::features::{FeatureVector, LiveObservation, ObservationInput};
