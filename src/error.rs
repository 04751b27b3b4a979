//! Error handling
//!
//! One taxonomy for the whole engine. Artifact errors mean the scoring
//! service is unavailable; record/observation errors are local to a single
//! request or row.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NidsError>;

/// Which persisted artifact an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Encoder,
    Model,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactKind::Encoder => write!(f, "encoder"),
            ArtifactKind::Model => write!(f, "model"),
        }
    }
}

#[derive(Error, Debug)]
pub enum NidsError {
    #[error("Missing {kind} artifact: {}", path.display())]
    MissingArtifact { kind: ArtifactKind, path: PathBuf },

    #[error("Invalid {kind} artifact: {reason}")]
    InvalidArtifact { kind: ArtifactKind, reason: String },

    #[error("Feature vector shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Layout(#[from] crate::logic::features::layout::LayoutMismatchError),

    #[error("Invalid observation field '{field}': {reason}")]
    InvalidObservation { field: &'static str, reason: String },

    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl NidsError {
    /// Artifact problems surface as "service unavailable" to callers
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            NidsError::MissingArtifact { .. } | NidsError::InvalidArtifact { .. }
        )
    }

    pub(crate) fn invalid_encoder(reason: impl Into<String>) -> Self {
        NidsError::InvalidArtifact {
            kind: ArtifactKind::Encoder,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_model(reason: impl Into<String>) -> Self {
        NidsError::InvalidArtifact {
            kind: ArtifactKind::Model,
            reason: reason.into(),
        }
    }
}
