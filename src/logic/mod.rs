//! Logic Module - schema, encoding, normalization and scoring
//!
//! - `features/` - Schema registry, feature vector, live fill policy, normalizer
//! - `encoder/` - Persisted categorical encoders
//! - `dataset/` - Headerless bulk reader
//! - `model/` - Classifier adapter (native forest, optional ONNX), metrics
//! - `context` - Immutable artifact set with explicit reload
//! - `history/` - Scan history and JSONL persistence

pub mod config;
pub mod context;
pub mod dataset;
pub mod encoder;
pub mod features;
pub mod history;
pub mod model;

#[cfg(test)]
pub(crate) mod fixtures;
