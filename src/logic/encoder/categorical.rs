//! Categorical Encoder - frozen vocabulary → integer code
//!
//! Codes are assigned in lexicographic order of the distinct training
//! values, so fitting the same data twice yields the same mapping.

use std::collections::{BTreeSet, HashMap};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{NidsError, Result};
use crate::logic::features::layout::FEATURE_VERSION;

/// Numeric stand-in for an unseen category inside a feature vector.
/// Always outside the valid code range `0..k`.
pub const UNKNOWN_SENTINEL: f32 = -1.0;

// ============================================================================
// ENCODED VALUE
// ============================================================================

/// Result of encoding one category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoded {
    Known(u32),
    Unknown,
}

impl Encoded {
    pub fn is_known(&self) -> bool {
        matches!(self, Encoded::Known(_))
    }

    /// Value written into the feature vector
    pub fn as_feature(&self) -> f32 {
        match self {
            Encoded::Known(code) => *code as f32,
            Encoded::Unknown => UNKNOWN_SENTINEL,
        }
    }
}

// ============================================================================
// ENCODER
// ============================================================================

/// Immutable once built: refitting replaces the whole encoder
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    attribute: String,
    classes: Vec<String>,
    index: HashMap<String, u32>,
}

impl CategoricalEncoder {
    /// Build from the distinct values of `values`
    pub fn fit<I, S>(attribute: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();

        if distinct.is_empty() {
            return Err(NidsError::invalid_encoder(format!(
                "cannot fit '{}' from an empty vocabulary",
                attribute
            )));
        }

        Ok(Self::from_sorted(attribute, distinct.into_iter().collect()))
    }

    fn from_sorted(attribute: &str, classes: Vec<String>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(code, class)| (class.clone(), code as u32))
            .collect();

        Self {
            attribute: attribute.to_string(),
            classes,
            index,
        }
    }

    pub fn transform(&self, value: &str) -> Encoded {
        match self.index.get(value) {
            Some(code) => Encoded::Known(*code),
            None => Encoded::Unknown,
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.index.contains_key(value)
    }

    /// Reverse lookup
    pub fn class_of(&self, code: u32) -> Option<&str> {
        self.classes.get(code as usize).map(|s| s.as_str())
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn to_artifact(&self) -> EncoderArtifact {
        EncoderArtifact {
            attribute: self.attribute.clone(),
            classes: self.classes.clone(),
            layout_version: FEATURE_VERSION,
            checksum: vocabulary_checksum(&self.classes),
        }
    }

    /// Rebuild from a persisted artifact, verifying it first
    pub fn from_artifact(artifact: EncoderArtifact) -> Result<Self> {
        if artifact.layout_version != FEATURE_VERSION {
            return Err(NidsError::invalid_encoder(format!(
                "'{}' was built for layout v{}, current is v{}",
                artifact.attribute, artifact.layout_version, FEATURE_VERSION
            )));
        }

        if artifact.checksum != vocabulary_checksum(&artifact.classes) {
            return Err(NidsError::invalid_encoder(format!(
                "checksum mismatch for '{}'",
                artifact.attribute
            )));
        }

        if artifact.classes.is_empty() {
            return Err(NidsError::invalid_encoder(format!(
                "'{}' has an empty vocabulary",
                artifact.attribute
            )));
        }

        // Codes are positions in a strictly sorted list; anything else means
        // the file was edited by hand or produced by an incompatible writer.
        if artifact.classes.windows(2).any(|w| w[0] >= w[1]) {
            return Err(NidsError::invalid_encoder(format!(
                "classes of '{}' are not strictly sorted",
                artifact.attribute
            )));
        }

        Ok(Self::from_sorted(&artifact.attribute, artifact.classes))
    }
}

// ============================================================================
// PERSISTED FORM
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderArtifact {
    pub attribute: String,
    /// Code `i` is `classes[i]`
    pub classes: Vec<String>,
    pub layout_version: u8,
    /// SHA-256 (hex) over the NUL-joined classes
    pub checksum: String,
}

pub fn vocabulary_checksum(classes: &[String]) -> String {
    let mut hasher = Sha256::new();
    for class in classes {
        hasher.update(class.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_sorts_lexicographically() {
        let enc = CategoricalEncoder::fit("protocol_type", ["udp", "tcp", "icmp", "tcp"]).unwrap();
        assert_eq!(enc.classes(), &["icmp", "tcp", "udp"]);
        assert_eq!(enc.transform("icmp"), Encoded::Known(0));
        assert_eq!(enc.transform("tcp"), Encoded::Known(1));
        assert_eq!(enc.transform("udp"), Encoded::Known(2));
    }

    #[test]
    fn test_fit_is_order_independent() {
        let a = CategoricalEncoder::fit("flag", ["SF", "S0", "REJ"]).unwrap();
        let b = CategoricalEncoder::fit("flag", ["REJ", "SF", "S0", "SF"]).unwrap();
        assert_eq!(a.classes(), b.classes());
    }

    #[test]
    fn test_unknown_is_not_a_code() {
        let enc = CategoricalEncoder::fit("flag", ["SF", "S0"]).unwrap();
        assert_eq!(enc.transform("RSTR"), Encoded::Unknown);
        assert_eq!(enc.transform("sf"), Encoded::Unknown);
        assert!(Encoded::Unknown.as_feature() < 0.0);
        assert_eq!(Encoded::Unknown.as_feature(), UNKNOWN_SENTINEL);
        assert_eq!(enc.transform("SF").as_feature(), 1.0);
    }

    #[test]
    fn test_transform_is_deterministic() {
        let enc = CategoricalEncoder::fit("service", ["http", "private", "ftp"]).unwrap();
        for _ in 0..5 {
            assert_eq!(enc.transform("private"), Encoded::Known(2));
        }
    }

    #[test]
    fn test_empty_fit_rejected() {
        let empty: Vec<&str> = Vec::new();
        assert!(CategoricalEncoder::fit("flag", empty).is_err());
    }

    #[test]
    fn test_artifact_checksum_detects_tampering() {
        let enc = CategoricalEncoder::fit("flag", ["SF", "S0"]).unwrap();
        let mut artifact = enc.to_artifact();
        assert!(CategoricalEncoder::from_artifact(artifact.clone()).is_ok());

        artifact.classes.push("ZZ".to_string());
        assert!(CategoricalEncoder::from_artifact(artifact).is_err());
    }

    #[test]
    fn test_artifact_rejects_unsorted_classes() {
        let classes = vec!["tcp".to_string(), "icmp".to_string()];
        let artifact = EncoderArtifact {
            attribute: "protocol_type".to_string(),
            checksum: vocabulary_checksum(&classes),
            classes,
            layout_version: FEATURE_VERSION,
        };
        assert!(CategoricalEncoder::from_artifact(artifact).is_err());
    }

    #[test]
    fn test_class_of() {
        let enc = CategoricalEncoder::fit("protocol_type", ["tcp", "udp"]).unwrap();
        assert_eq!(enc.class_of(1), Some("udp"));
        assert_eq!(enc.class_of(2), None);
    }
}
