//! Feature Layout - NSL-KDD Schema Registry
//!
//! **CRITICAL: This file controls the feature schema**
//!
//! ## Rules (NEVER break these):
//! 1. The 41 input columns keep the NSL-KDD order
//! 2. Any change to names, order or kinds → increment FEATURE_VERSION
//!
//! The trained classifier consumes vectors by position, so a reordering
//! silently invalidates every prediction. The layout hash lets artifacts and
//! logged vectors detect that.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
/// MUST be incremented when layout changes
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// COLUMN KINDS
// ============================================================================

/// How a column is turned into a number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Continuous value, count or rate. Consumed as raw magnitude (no scaling).
    Numeric,
    /// Finite string vocabulary, encoded through the encoder store
    Categorical,
}

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Input attributes in exact vector order
pub const FEATURE_LAYOUT: &[(&str, ColumnKind)] = &[
    // === Basic connection (0-9) ===
    ("duration", ColumnKind::Numeric),              // 0
    ("protocol_type", ColumnKind::Categorical),     // 1
    ("service", ColumnKind::Categorical),           // 2
    ("flag", ColumnKind::Categorical),              // 3
    ("src_bytes", ColumnKind::Numeric),             // 4
    ("dst_bytes", ColumnKind::Numeric),             // 5
    ("land", ColumnKind::Numeric),                  // 6
    ("wrong_fragment", ColumnKind::Numeric),        // 7
    ("urgent", ColumnKind::Numeric),                // 8
    ("hot", ColumnKind::Numeric),                   // 9

    // === Content (10-21) ===
    ("num_failed_logins", ColumnKind::Numeric),     // 10
    ("logged_in", ColumnKind::Numeric),             // 11
    ("num_compromised", ColumnKind::Numeric),       // 12
    ("root_shell", ColumnKind::Numeric),            // 13
    ("su_attempted", ColumnKind::Numeric),          // 14
    ("num_root", ColumnKind::Numeric),              // 15
    ("num_file_creations", ColumnKind::Numeric),    // 16
    ("num_shells", ColumnKind::Numeric),            // 17
    ("num_access_files", ColumnKind::Numeric),      // 18
    ("num_outbound_cmds", ColumnKind::Numeric),     // 19
    ("is_host_login", ColumnKind::Numeric),         // 20
    ("is_guest_login", ColumnKind::Numeric),        // 21

    // === Time-based traffic (22-30) ===
    ("count", ColumnKind::Numeric),                 // 22
    ("srv_count", ColumnKind::Numeric),             // 23
    ("serror_rate", ColumnKind::Numeric),           // 24
    ("srv_serror_rate", ColumnKind::Numeric),       // 25
    ("rerror_rate", ColumnKind::Numeric),           // 26
    ("srv_rerror_rate", ColumnKind::Numeric),       // 27
    ("same_srv_rate", ColumnKind::Numeric),         // 28
    ("diff_srv_rate", ColumnKind::Numeric),         // 29
    ("srv_diff_host_rate", ColumnKind::Numeric),    // 30

    // === Host-based traffic (31-40) ===
    ("dst_host_count", ColumnKind::Numeric),                // 31
    ("dst_host_srv_count", ColumnKind::Numeric),            // 32
    ("dst_host_same_srv_rate", ColumnKind::Numeric),        // 33
    ("dst_host_diff_srv_rate", ColumnKind::Numeric),        // 34
    ("dst_host_same_src_port_rate", ColumnKind::Numeric),   // 35
    ("dst_host_srv_diff_host_rate", ColumnKind::Numeric),   // 36
    ("dst_host_serror_rate", ColumnKind::Numeric),          // 37
    ("dst_host_srv_serror_rate", ColumnKind::Numeric),      // 38
    ("dst_host_rerror_rate", ColumnKind::Numeric),          // 39
    ("dst_host_srv_rerror_rate", ColumnKind::Numeric),      // 40
];

/// Total number of input features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 41;

/// Categorical columns, in schema order
pub const CATEGORICAL_ATTRIBUTES: [&str; 3] = ["protocol_type", "service", "flag"];

/// Trailing columns of a bulk row that are not features
pub const LABEL_COLUMN: &str = "label";
pub const DIFFICULTY_COLUMN: &str = "difficulty";

/// Position of the label in a bulk row
pub const LABEL_POSITION: usize = FEATURE_COUNT;

/// Position of the difficulty score in a bulk row (dropped before features)
pub const DIFFICULTY_POSITION: usize = FEATURE_COUNT + 1;

/// Field count of a complete bulk row: 41 features + label + difficulty
pub const RAW_COLUMN_COUNT: usize = FEATURE_COUNT + 2;

/// The only label text that maps to class 0
pub const NORMAL_LABEL: &str = "normal";

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// Compute CRC32 hash of the feature layout
/// Used to detect layout mismatches at runtime
pub fn compute_layout_hash() -> u32 {
    let mut hasher = Hasher::new();

    hasher.update(&[FEATURE_VERSION]);

    for (name, kind) in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[*kind as u8]);
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

pub fn layout_hash() -> u32 {
    compute_layout_hash()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Complete layout information for serialization/logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
    pub categorical: Vec<String>,
    pub label_position: usize,
    pub difficulty_position: usize,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_count: FEATURE_COUNT,
            feature_names: FEATURE_LAYOUT.iter().map(|(n, _)| n.to_string()).collect(),
            categorical: CATEGORICAL_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
            label_position: LABEL_POSITION,
            difficulty_position: DIFFICULTY_POSITION,
        }
    }
}

impl Default for LayoutInfo {
    fn default() -> Self {
        Self::current()
    }
}

// ============================================================================
// LAYOUT VALIDATION
// ============================================================================

/// Error when feature layout doesn't match expected
#[derive(Debug, Clone)]
pub struct LayoutMismatchError {
    pub expected_version: u8,
    pub expected_hash: u32,
    pub actual_version: u8,
    pub actual_hash: u32,
}

impl std::fmt::Display for LayoutMismatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Feature layout mismatch: expected v{} (hash: {:08x}), got v{} (hash: {:08x})",
            self.expected_version,
            self.expected_hash,
            self.actual_version,
            self.actual_hash
        )
    }
}

impl std::error::Error for LayoutMismatchError {}

/// Validate that incoming data matches current layout
pub fn validate_layout(incoming_version: u8, incoming_hash: u32) -> Result<(), LayoutMismatchError> {
    let current_hash = layout_hash();

    if incoming_version != FEATURE_VERSION || incoming_hash != current_hash {
        return Err(LayoutMismatchError {
            expected_version: FEATURE_VERSION,
            expected_hash: current_hash,
            actual_version: incoming_version,
            actual_hash: incoming_hash,
        });
    }

    Ok(())
}

// ============================================================================
// FEATURE INDEX LOOKUP
// ============================================================================

/// Get feature index by name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|(n, _)| *n == name)
}

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).map(|(n, _)| *n)
}

pub fn column_kind(index: usize) -> Option<ColumnKind> {
    FEATURE_LAYOUT.get(index).map(|(_, k)| *k)
}

pub fn is_categorical(name: &str) -> bool {
    CATEGORICAL_ATTRIBUTES.contains(&name)
}

/// Binary target: 0 iff the text is exactly "normal" (case-sensitive)
pub fn binarize_label(label: &str) -> u8 {
    if label == NORMAL_LABEL { 0 } else { 1 }
}

// ============================================================================
// TESTS
// ============================================================================
