//! Ordinal scoring metrics shared by the estimator wrappers.
//!
//! All metrics operate on predicted and true class indices. The
//! [`OrdinalMetric`] enum is the pluggable scoring choice carried by each
//! estimator; `evaluate` returns the negated loss so that higher is always
//! better, matching the fit/score convention.
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Mean absolute distance between predicted and true class indices.
pub fn mean_absolute_error(pred: &[usize], truth: &[usize]) -> f64 {
    assert_eq!(
        pred.len(),
        truth.len(),
        "prediction and truth must have equal length"
    );
    if pred.is_empty() {
        return 0.0;
    }
    let total: f64 = pred
        .iter()
        .zip(truth.iter())
        .map(|(&p, &t)| (p as f64 - t as f64).abs())
        .sum();
    total / pred.len() as f64
}

/// Fraction of samples whose predicted class differs from the true class.
pub fn zero_one_loss(pred: &[usize], truth: &[usize]) -> f64 {
    assert_eq!(
        pred.len(),
        truth.len(),
        "prediction and truth must have equal length"
    );
    if pred.is_empty() {
        return 0.0;
    }
    let wrong = pred.iter().zip(truth.iter()).filter(|(p, t)| p != t).count();
    wrong as f64 / pred.len() as f64
}

/// Fraction of ordered pairs ranked in the wrong direction.
///
/// Considers every pair (i, j) with truth[i] != truth[j]. A pair counts as a
/// full disagreement when the predictions order it opposite to the truth and
/// as half a disagreement when the predictions tie. Returns 0 when no pair
/// carries ordering information.
pub fn pairwise_disagreement(pred: &[usize], truth: &[usize]) -> f64 {
    assert_eq!(
        pred.len(),
        truth.len(),
        "prediction and truth must have equal length"
    );
    let mut informative = 0usize;
    let mut disagree = 0.0;
    for i in 0..truth.len() {
        for j in (i + 1)..truth.len() {
            if truth[i] == truth[j] {
                continue;
            }
            informative += 1;
            if pred[i] == pred[j] {
                disagree += 0.5;
            } else if (pred[i] < pred[j]) != (truth[i] < truth[j]) {
                disagree += 1.0;
            }
        }
    }
    if informative == 0 {
        0.0
    } else {
        disagree / informative as f64
    }
}

/// Scoring metric applied by an estimator's `score`.
///
/// Selected per estimator instance at construction time.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrdinalMetric {
    MeanAbsoluteError,
    ZeroOneLoss,
    PairwiseDisagreement,
}

impl OrdinalMetric {
    /// Score predictions against the truth; higher is better (negated loss).
    pub fn evaluate(&self, pred: &[usize], truth: &[usize]) -> f64 {
        match self {
            OrdinalMetric::MeanAbsoluteError => -mean_absolute_error(pred, truth),
            OrdinalMetric::ZeroOneLoss => -zero_one_loss(pred, truth),
            OrdinalMetric::PairwiseDisagreement => -pairwise_disagreement(pred, truth),
        }
    }
}

impl Default for OrdinalMetric {
    fn default() -> Self {
        OrdinalMetric::MeanAbsoluteError
    }
}

impl FromStr for OrdinalMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mae" | "mean_absolute_error" => Ok(OrdinalMetric::MeanAbsoluteError),
            "0-1" | "zero_one_loss" => Ok(OrdinalMetric::ZeroOneLoss),
            "pairwise" | "pairwise_disagreement" => Ok(OrdinalMetric::PairwiseDisagreement),
            _ => Err(format!(
                "Unknown metric: {}. Valid options are: mae, 0-1, pairwise",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_absolute_error() {
        let pred = vec![0, 1, 2, 4];
        let truth = vec![0, 2, 2, 1];
        assert!((mean_absolute_error(&pred, &truth) - 1.0).abs() < 1e-12);
        assert_eq!(mean_absolute_error(&[], &[]), 0.0);
    }

    #[test]
    fn test_zero_one_loss() {
        let pred = vec![0, 1, 2, 3];
        let truth = vec![0, 2, 2, 1];
        assert!((zero_one_loss(&pred, &truth) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_pairwise_disagreement() {
        // perfect ordering
        assert_eq!(pairwise_disagreement(&[0, 1, 2], &[0, 1, 2]), 0.0);
        // fully reversed
        assert_eq!(pairwise_disagreement(&[2, 1, 0], &[0, 1, 2]), 1.0);
        // constant predictions tie every informative pair
        assert!((pairwise_disagreement(&[1, 1, 1], &[0, 1, 2]) - 0.5).abs() < 1e-12);
        // no informative pairs
        assert_eq!(pairwise_disagreement(&[0, 1], &[1, 1]), 0.0);
    }

    #[test]
    fn test_metric_evaluate_is_negated() {
        let pred = vec![0, 1, 2, 4];
        let truth = vec![0, 2, 2, 1];
        let m = OrdinalMetric::default();
        assert!((m.evaluate(&pred, &truth) + 1.0).abs() < 1e-12);
        assert!(OrdinalMetric::ZeroOneLoss.evaluate(&truth, &truth) == 0.0);
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!(
            OrdinalMetric::from_str("MAE").unwrap(),
            OrdinalMetric::MeanAbsoluteError
        );
        assert_eq!(
            OrdinalMetric::from_str("pairwise").unwrap(),
            OrdinalMetric::PairwiseDisagreement
        );
        assert!(OrdinalMetric::from_str("auc").is_err());
    }
}
