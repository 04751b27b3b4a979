use serde::{Deserialize, Serialize};
use csv::StringRecord;

use crate::error::{NidsError, Result};
use crate::logic::features::layout::{
    ColumnKind, FEATURE_LAYOUT, LABEL_POSITION, DIFFICULTY_POSITION, RAW_COLUMN_COUNT,
};

/// One raw column value of a bulk row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawField {
    Number(f32),
    Category(String),
}

/// A complete NSL-KDD row: 41 feature fields + label + difficulty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    /// 1-based line in the source file
    pub line: u64,
    pub fields: Vec<RawField>,
    pub label: String,
    pub difficulty: u32,
}

/// A row that failed to parse; the rest of the file is unaffected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRecord {
    pub line: u64,
    pub reason: String,
}

impl From<RejectedRecord> for NidsError {
    fn from(r: RejectedRecord) -> Self {
        NidsError::MalformedRecord { line: r.line, reason: r.reason }
    }
}

impl RawRecord {
    /// Parse positional fields. No coercion: a field that is not exactly
    /// what its column expects rejects the whole row.
    pub fn parse(line: u64, row: &StringRecord) -> Result<Self> {
        let malformed = |reason: String| NidsError::MalformedRecord { line, reason };

        if row.len() != RAW_COLUMN_COUNT {
            return Err(malformed(format!(
                "expected {} fields, got {}",
                RAW_COLUMN_COUNT,
                row.len()
            )));
        }

        let mut fields = Vec::with_capacity(FEATURE_LAYOUT.len());
        for (position, (name, kind)) in FEATURE_LAYOUT.iter().enumerate() {
            let text = row.get(position).unwrap_or_default();
            let field = match kind {
                // Padding around a number is layout, not data
                ColumnKind::Numeric => {
                    let text = text.trim();
                    let value: f32 = text
                        .parse()
                        .map_err(|_| malformed(format!("'{}' is not numeric: {:?}", name, text)))?;
                    if !value.is_finite() {
                        return Err(malformed(format!("'{}' is not finite: {:?}", name, text)));
                    }
                    RawField::Number(value)
                }
                ColumnKind::Categorical => {
                    if text.is_empty() {
                        return Err(malformed(format!("'{}' is empty", name)));
                    }
                    RawField::Category(text.to_string())
                }
            };
            fields.push(field);
        }

        // Labels and categories are kept verbatim: " normal " is not "normal"
        let label = row.get(LABEL_POSITION).unwrap_or_default();
        if label.is_empty() {
            return Err(malformed("label is empty".to_string()));
        }

        let difficulty_text = row.get(DIFFICULTY_POSITION).unwrap_or_default().trim();
        let difficulty = difficulty_text
            .parse()
            .map_err(|_| malformed(format!("difficulty is not an integer: {:?}", difficulty_text)))?;

        Ok(Self {
            line,
            fields,
            label: label.to_string(),
            difficulty,
        })
    }

    /// Category text at a schema position, if that column is categorical
    pub fn category(&self, position: usize) -> Option<&str> {
        match self.fields.get(position) {
            Some(RawField::Category(value)) => Some(value),
            _ => None,
        }
    }

    pub fn category_by_name(&self, name: &str) -> Option<&str> {
        crate::logic::features::layout::feature_index(name).and_then(|i| self.category(i))
    }
}
