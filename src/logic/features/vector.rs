//! Feature Vector - Core data structure for classifier input
//!
//! **Versioned feature vector with layout validation**
//!
//! Length is fixed at construction: a `FeatureVector` always holds exactly
//! `FEATURE_COUNT` values in `FEATURE_LAYOUT` order. Anything that cannot
//! meet that is rejected, never truncated or padded.

use serde::{Deserialize, Serialize};
use super::layout::{
    FEATURE_COUNT, FEATURE_VERSION, FEATURE_LAYOUT,
    layout_hash, validate_layout, LayoutMismatchError,
};
use crate::error::{NidsError, Result};

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FeatureVectorRepr")]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout (for mismatch detection)
    pub layout_hash: u32,
    /// Feature values in order defined by FEATURE_LAYOUT
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct FeatureVectorRepr {
    version: u8,
    layout_hash: u32,
    values: Vec<f32>,
}

impl TryFrom<FeatureVectorRepr> for FeatureVector {
    type Error = NidsError;

    fn try_from(repr: FeatureVectorRepr) -> Result<Self> {
        let mut vector = FeatureVector::from_vec(repr.values)?;
        vector.version = repr.version;
        vector.layout_hash = repr.layout_hash;
        Ok(vector)
    }
}

impl FeatureVector {
    /// Create a new zeroed feature vector with current version
    pub fn new() -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values: vec![0.0; FEATURE_COUNT],
        }
    }

    pub fn from_values(values: [f32; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values: values.to_vec(),
        }
    }

    /// Create from a Vec<f32>; the length must equal FEATURE_COUNT
    pub fn from_vec(values: Vec<f32>) -> Result<Self> {
        if values.len() != FEATURE_COUNT {
            return Err(NidsError::ShapeMismatch {
                expected: FEATURE_COUNT,
                got: values.len(),
            });
        }
        Ok(Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        })
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<f32> {
        super::layout::feature_index(name).and_then(|i| self.get(i))
    }

    /// Set feature by index (out-of-range indices are ignored)
    pub fn set(&mut self, index: usize, value: f32) {
        if index < FEATURE_COUNT {
            self.values[index] = value;
        }
    }

    /// Set feature by name
    pub fn set_by_name(&mut self, name: &str, value: f32) -> bool {
        if let Some(index) = super::layout::feature_index(name) {
            self.set(index, value);
            true
        } else {
            false
        }
    }

    /// Validate that this vector is compatible with current layout
    pub fn validate(&self) -> std::result::Result<(), LayoutMismatchError> {
        validate_layout(self.version, self.layout_hash)
    }

    pub fn is_compatible(&self) -> bool {
        self.validate().is_ok()
    }

    /// Convert to JSON-serializable format for logging
    pub fn to_log_entry(&self) -> serde_json::Value {
        serde_json::json!({
            "feature_version": self.version,
            "layout_hash": self.layout_hash,
            "values": self.values,
            "named_values": FEATURE_LAYOUT.iter()
                .zip(self.values.iter())
                .map(|((name, _), value)| (name.to_string(), *value))
                .collect::<std::collections::BTreeMap<_, _>>(),
        })
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[f32; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f32; FEATURE_COUNT]) -> Self {
        Self::from_values(values)
    }
}

impl TryFrom<Vec<f32>> for FeatureVector {
    type Error = NidsError;

    fn try_from(values: Vec<f32>) -> Result<Self> {
        Self::from_vec(values)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_new() {
        let vector = FeatureVector::new();
        assert_eq!(vector.version, FEATURE_VERSION);
        assert_eq!(vector.layout_hash, layout_hash());
        assert_eq!(vector.as_slice().len(), FEATURE_COUNT);
        assert!(vector.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        let short = FeatureVector::from_vec(vec![0.0; 40]);
        assert!(matches!(short, Err(NidsError::ShapeMismatch { expected: 41, got: 40 })));

        let long = FeatureVector::from_vec(vec![0.0; 42]);
        assert!(matches!(long, Err(NidsError::ShapeMismatch { expected: 41, got: 42 })));

        assert!(FeatureVector::from_vec(vec![1.0; 41]).is_ok());
    }

    #[test]
    fn test_set_by_name() {
        let mut vector = FeatureVector::new();
        assert!(vector.set_by_name("serror_rate", 0.75));
        assert_eq!(vector.get(24), Some(0.75));
        assert_eq!(vector.get_by_name("serror_rate"), Some(0.75));
        assert!(!vector.set_by_name("nonexistent", 1.0));
    }

    #[test]
    fn test_deserialize_rejects_wrong_length() {
        let json = serde_json::json!({
            "version": FEATURE_VERSION,
            "layout_hash": layout_hash(),
            "values": [0.0, 1.0, 2.0],
        });
        assert!(serde_json::from_value::<FeatureVector>(json).is_err());

        let vector = FeatureVector::from_values([2.5; FEATURE_COUNT]);
        let text = serde_json::to_string(&vector).unwrap();
        let back: FeatureVector = serde_json::from_str(&text).unwrap();
        assert_eq!(back, vector);
    }

    #[test]
    fn test_to_log_entry() {
        let mut vector = FeatureVector::new();
        vector.set_by_name("src_bytes", 491.0);

        let log = vector.to_log_entry();
        assert_eq!(log["feature_version"], FEATURE_VERSION);
        assert_eq!(log["named_values"]["src_bytes"], 491.0);
    }
}
