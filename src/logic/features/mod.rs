//! Features Module - NSL-KDD feature construction
//!
//! Schema registry, the fixed-length vector, the live-observation contract
//! and the normalizer that turns raw input into vectors.

pub mod layout;
pub mod vector;
pub mod live;
pub mod normalizer;


// Re-export common types
pub use layout::{FEATURE_COUNT, FEATURE_LAYOUT, CATEGORICAL_ATTRIBUTES, ColumnKind, LayoutInfo};
pub use vector::FeatureVector;
pub use live::{ConnFlag, FlowShape, LiveObservation, ObservationInput, Protocol};
pub use normalizer::{
    NormalizedBatch, NormalizedObservation, NormalizerConfig, RecordNormalizer, UnknownCategory,
};
