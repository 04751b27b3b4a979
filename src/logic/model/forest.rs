//! Tree Ensemble - native model artifact
//!
//! Flat per-tree arrays, the same shape a fitted scikit-learn forest keeps
//! in `tree_` (children_left / children_right / feature / threshold), with
//! `value` reduced to the attack-class fraction at each node. Probability is
//! the mean leaf value across trees, matching `predict_proba`.

use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::error::{ArtifactKind, NidsError, Result};
use crate::logic::encoder::store::write_json_atomic;
use crate::logic::features::layout::{FEATURE_COUNT, FEATURE_VERSION};

pub const FOREST_FORMAT: &str = "tree-ensemble";

/// `children_left[i] == LEAF` marks node `i` as a leaf
pub const LEAF: i32 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub children_left: Vec<i32>,
    pub children_right: Vec<i32>,
    pub feature: Vec<i32>,
    pub threshold: Vec<f64>,
    /// Fraction of attack samples at the node
    pub value: Vec<f64>,
}

impl Tree {
    pub fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn validate(&self, index: usize, n_features: usize) -> Result<()> {
        let n = self.node_count();
        let invalid = |reason: String| NidsError::invalid_model(format!("tree {}: {}", index, reason));

        if n == 0 {
            return Err(invalid("no nodes".into()));
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(invalid("node arrays differ in length".into()));
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);

            if left == LEAF || right == LEAF {
                if left != right {
                    return Err(invalid(format!("node {} has exactly one child", node)));
                }
                let v = self.value[node];
                if !(0.0..=1.0).contains(&v) {
                    return Err(invalid(format!("leaf {} value {} outside [0, 1]", node, v)));
                }
                continue;
            }

            // Children always come after their parent, so traversal terminates
            for child in [left, right] {
                if child <= node as i32 || child as usize >= n {
                    return Err(invalid(format!("node {} has bad child {}", node, child)));
                }
            }

            let feature = self.feature[node];
            if feature < 0 || feature as usize >= n_features {
                return Err(invalid(format!("node {} splits on feature {}", node, feature)));
            }
            if self.threshold[node].is_nan() {
                return Err(invalid(format!("node {} has NaN threshold", node)));
            }
        }

        Ok(())
    }

    /// Attack fraction of the leaf reached by `x`. `None` when the tree or
    /// `x` is malformed; the walk never indexes out of bounds.
    pub fn leaf_value(&self, x: &[f32]) -> Option<f64> {
        let mut node = 0usize;
        // A valid tree reaches a leaf in at most node_count steps
        for _ in 0..=self.node_count() {
            let left = *self.children_left.get(node)?;
            if left == LEAF {
                return self.value.get(node).copied();
            }
            let feature = usize::try_from(*self.feature.get(node)?).ok()?;
            let goes_left = (*x.get(feature)? as f64) <= *self.threshold.get(node)?;
            let next = if goes_left { left } else { *self.children_right.get(node)? };
            node = usize::try_from(next).ok()?;
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    pub format: String,
    pub n_features: usize,
    pub layout_version: u8,
    pub trees: Vec<Tree>,
}

impl ForestModel {
    /// Build an ensemble for the current layout. Malformed trees are rejected.
    pub fn new(trees: Vec<Tree>) -> Result<Self> {
        let model = Self {
            format: FOREST_FORMAT.to_string(),
            n_features: FEATURE_COUNT,
            layout_version: FEATURE_VERSION,
            trees,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        if self.format != FOREST_FORMAT {
            return Err(NidsError::invalid_model(format!("unsupported format '{}'", self.format)));
        }
        if self.n_features != FEATURE_COUNT {
            return Err(NidsError::invalid_model(format!(
                "model expects {} features, schema has {}",
                self.n_features, FEATURE_COUNT
            )));
        }
        if self.layout_version != FEATURE_VERSION {
            return Err(NidsError::invalid_model(format!(
                "model built for layout v{}, current is v{}",
                self.layout_version, FEATURE_VERSION
            )));
        }
        if self.trees.is_empty() {
            return Err(NidsError::invalid_model("ensemble has no trees"));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, self.n_features)?;
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(NidsError::MissingArtifact {
                kind: ArtifactKind::Model,
                path: path.to_path_buf(),
            });
        }

        let data = fs::read(path)?;
        let model: ForestModel = serde_json::from_slice(&data)
            .map_err(|e| NidsError::invalid_model(format!("{}: {}", path.display(), e)))?;
        model.validate()?;

        log::info!(
            "Loaded tree ensemble ({} trees) from {}",
            model.trees.len(),
            path.display()
        );
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        write_json_atomic(path, self)
    }

    /// Mean attack fraction over all trees. `x` must be schema-length.
    pub fn predict_proba(&self, x: &[f32]) -> Result<f64> {
        if self.trees.is_empty() {
            return Err(NidsError::Inference("ensemble has no trees".to_string()));
        }

        let mut sum = 0.0;
        for (i, tree) in self.trees.iter().enumerate() {
            sum += tree.leaf_value(x).ok_or_else(|| {
                NidsError::Inference(format!("tree {} could not be evaluated", i))
            })?;
        }
        Ok(sum / self.trees.len() as f64)
    }
}
