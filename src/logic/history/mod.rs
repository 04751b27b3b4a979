//! Scan History - append-only log of live scan reports
//!
//! Ordering only matters for display (newest first); every scan is scored
//! independently of the ones before it.

pub mod writer;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, VecDeque};
use serde::{Deserialize, Serialize};

use crate::logic::context::ScanReport;

pub use writer::HistoryWriter;

/// Last-scan risk above which the dashboard shows CRITICAL
pub const CRITICAL_RISK: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLabel {
    Safe,
    Critical,
}

impl RiskLabel {
    pub fn from_probability(p: f64) -> Self {
        if p > CRITICAL_RISK {
            RiskLabel::Critical
        } else {
            RiskLabel::Safe
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_scans: usize,
    pub malicious: usize,
    /// Probability of the newest scan, 0 when empty
    pub last_risk: f64,
    pub risk_label: RiskLabel,
    /// NORMAL / MALICIOUS → count
    pub status_distribution: BTreeMap<String, usize>,
    /// protocol → count
    pub protocol_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct ScanHistory {
    entries: VecDeque<ScanReport>,
    limit: usize,
}

impl ScanHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Newest goes to the front; the oldest falls off past the limit
    pub fn record(&mut self, report: ScanReport) {
        self.entries.push_front(report);
        self.entries.truncate(self.limit);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&ScanReport> {
        self.entries.front()
    }

    /// Newest first
    pub fn iter(&self) -> impl Iterator<Item = &ScanReport> {
        self.entries.iter()
    }

    pub fn recent(&self, n: usize) -> Vec<ScanReport> {
        self.entries.iter().take(n).cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn summary(&self) -> HistorySummary {
        let mut status_distribution = BTreeMap::new();
        let mut protocol_distribution = BTreeMap::new();
        let mut malicious = 0;

        for report in &self.entries {
            if report.is_malicious() {
                malicious += 1;
            }
            *status_distribution.entry(report.label.to_string()).or_insert(0) += 1;
            *protocol_distribution
                .entry(report.protocol.as_str().to_string())
                .or_insert(0) += 1;
        }

        let last_risk = self.latest().map(|r| r.probability).unwrap_or(0.0);

        HistorySummary {
            total_scans: self.entries.len(),
            malicious,
            last_risk,
            risk_label: RiskLabel::from_probability(last_risk),
            status_distribution,
            protocol_distribution,
        }
    }
}

impl Default for ScanHistory {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_HISTORY_LIMIT)
    }
}
