use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::metrics::OrdinalMetric;

/// Surrogate-loss weighting for the threshold model.
///
/// `AbsoluteError` weights every threshold comparison uniformly and
/// approximates mean absolute error; `ZeroOne` concentrates weight on the
/// thresholds adjacent to the true class and approximates zero-one loss.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LossMode {
    AbsoluteError,
    ZeroOne,
}

impl Default for LossMode {
    fn default() -> Self {
        LossMode::AbsoluteError
    }
}

impl FromStr for LossMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ae" | "absolute_error" => Ok(LossMode::AbsoluteError),
            "0-1" | "zero_one" => Ok(LossMode::ZeroOne),
            _ => Err(format!(
                "Unknown loss mode: {}. Valid options are: AE, 0-1",
                s
            )),
        }
    }
}

/// Cost matrix applied to wrong-class hinge terms in the multiclass model.
///
/// `Uniform` charges every wrong class equally (the default); this makes the
/// objective behave like a 0/1-cost multiclass margin loss.
/// `OrdinalDistance` charges |true - predicted| and is the documented
/// ordinal-sensitive alternative.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CostMatrix {
    Uniform,
    OrdinalDistance,
}

impl Default for CostMatrix {
    fn default() -> Self {
        CostMatrix::Uniform
    }
}

impl FromStr for CostMatrix {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uniform" => Ok(CostMatrix::Uniform),
            "ordinal" | "ordinal_distance" => Ok(CostMatrix::OrdinalDistance),
            _ => Err(format!(
                "Unknown cost matrix: {}. Valid options are: uniform, ordinal",
                s
            )),
        }
    }
}

/// Configuration for the threshold (cut-point) model.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ThresholdConfig {
    /// Number of ordinal classes (labels are 0..n_class-1).
    pub n_class: usize,
    /// L2 regularization strength on the direction vector.
    pub alpha: f64,
    /// Surrogate-loss weighting mode.
    pub mode: LossMode,
    /// Iteration cap handed to the external minimizer.
    pub max_iter: u64,
    /// Constrain threshold increments to be non-negative so the ordering is
    /// structural. When false, ordering relies on the defensive sort alone.
    pub bound_increments: bool,
    /// Scoring metric used by `score`.
    pub metric: OrdinalMetric,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            n_class: 2,
            alpha: 1.0,
            mode: LossMode::AbsoluteError,
            max_iter: 10_000,
            bound_increments: true,
            metric: OrdinalMetric::MeanAbsoluteError,
        }
    }
}

impl ThresholdConfig {
    pub fn new(n_class: usize, alpha: f64, mode: LossMode) -> Self {
        Self {
            n_class,
            alpha,
            mode,
            ..Self::default()
        }
    }
}

/// Configuration for the multiclass margin model.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct MulticlassConfig {
    /// Number of ordinal classes (labels are 0..n_class-1).
    pub n_class: usize,
    /// Regularization strength on the scoring matrix (bias row excluded).
    pub alpha: f64,
    /// Iteration cap per minimizer run.
    pub max_iter: u64,
    /// Number of restarts chained after the first minimization. Each restart
    /// re-launches the gradient-free solver from the previous best point.
    pub restarts: usize,
    /// Cost matrix for wrong-class hinge terms.
    pub cost: CostMatrix,
    /// Scoring metric used by `score`.
    pub metric: OrdinalMetric,
    /// Seed for the random initialization; None draws from entropy.
    pub seed: Option<u64>,
}

impl Default for MulticlassConfig {
    fn default() -> Self {
        Self {
            n_class: 2,
            alpha: 1.0,
            max_iter: 10_000,
            restarts: 1,
            cost: CostMatrix::Uniform,
            metric: OrdinalMetric::MeanAbsoluteError,
            seed: None,
        }
    }
}

impl MulticlassConfig {
    pub fn new(n_class: usize, alpha: f64) -> Self {
        Self {
            n_class,
            alpha,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_mode_from_str() {
        assert_eq!(LossMode::from_str("AE").unwrap(), LossMode::AbsoluteError);
        assert_eq!(LossMode::from_str("0-1").unwrap(), LossMode::ZeroOne);
        assert!(LossMode::from_str("hinge").is_err());
    }

    #[test]
    fn test_cost_matrix_from_str() {
        assert_eq!(CostMatrix::from_str("uniform").unwrap(), CostMatrix::Uniform);
        assert_eq!(
            CostMatrix::from_str("ordinal").unwrap(),
            CostMatrix::OrdinalDistance
        );
        assert!(CostMatrix::from_str("squared").is_err());
    }

    #[test]
    fn test_defaults() {
        let t = ThresholdConfig::default();
        assert_eq!(t.n_class, 2);
        assert!(t.bound_increments);
        let m = MulticlassConfig::default();
        assert_eq!(m.restarts, 1);
        assert_eq!(m.cost, CostMatrix::Uniform);
    }
}
