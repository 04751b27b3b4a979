//! Encoder Module - Categorical encodings
//!
//! Vocabularies are frozen when the batch job fits them and reused verbatim
//! at inference time, so integer codes mean the same thing in both.

pub mod categorical;
pub mod store;

#[cfg(test)]
mod tests;

pub use categorical::{CategoricalEncoder, Encoded, EncoderArtifact, UNKNOWN_SENTINEL};
pub use store::EncoderStore;
