//! Evaluation metrics for binary detection

use serde::{Deserialize, Serialize};

/// Rows = truth, columns = prediction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(truth: &[u8], predicted: &[u8]) -> Self {
        let mut m = Self::default();
        for (&t, &p) in truth.iter().zip(predicted.iter()) {
            match (t, p) {
                (0, 0) => m.true_negative += 1,
                (0, _) => m.false_positive += 1,
                (_, 0) => m.false_negative += 1,
                _ => m.true_positive += 1,
            }
        }
        m
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_negative + self.true_positive, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_counts() {
        let truth = [0, 0, 1, 1, 1];
        let pred = [0, 1, 1, 0, 1];
        let m = ConfusionMatrix::from_labels(&truth, &pred);
        assert_eq!(m.true_negative, 1);
        assert_eq!(m.false_positive, 1);
        assert_eq!(m.false_negative, 1);
        assert_eq!(m.true_positive, 2);
        assert_eq!(m.total(), 5);
        assert!((m.accuracy() - 0.6).abs() < 1e-12);
        assert!((m.precision() - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.recall() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_is_zero() {
        let m = ConfusionMatrix::from_labels(&[], &[]);
        assert_eq!(m.accuracy(), 0.0);
        assert_eq!(m.f1(), 0.0);
    }
}
