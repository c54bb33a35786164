//! Threshold (cut-point) ordinal regression.
//!
//! One shared direction w scores every sample; K-1 ordered thresholds
//! partition the score line into K ordinal intervals. Training minimizes a
//! logistic surrogate of either mean absolute error or zero-one loss with an
//! analytic gradient. The thresholds are optimized as increments c with
//! theta = prefix-sum(c), so constraining c[1..] to be non-negative makes
//! the ordering structural.
use std::cmp::Ordering;

use ndarray::{s, Array1, Array2};

use crate::config::{LossMode, ThresholdConfig};
use crate::error::ModelError;
use crate::math::{log_loss, sigmoid};
use crate::models::estimator::OrdinalEstimator;
use crate::models::{validate_feature_count, validate_fit_inputs};
use crate::solver::{minimize_smooth, Bound, SmoothObjective};

/// Optimizer-facing parameter block: direction w and threshold increments c.
///
/// Packing to and from the minimizer's flat vector happens only at the
/// solver call site; everything else works with the named fields.
#[derive(Debug, Clone)]
pub struct MarginParams {
    pub w: Array1<f64>,
    pub c: Array1<f64>,
}

impl MarginParams {
    fn unpack(flat: &Array1<f64>, n_features: usize) -> Self {
        Self {
            w: flat.slice(s![..n_features]).to_owned(),
            c: flat.slice(s![n_features..]).to_owned(),
        }
    }

    fn pack(&self) -> Array1<f64> {
        let mut flat = Vec::with_capacity(self.w.len() + self.c.len());
        flat.extend(self.w.iter().copied());
        flat.extend(self.c.iter().copied());
        Array1::from_vec(flat)
    }

    /// Thresholds as the prefix sum of the increments.
    pub fn thresholds(&self) -> Array1<f64> {
        let mut acc = 0.0;
        self.c
            .iter()
            .map(|&v| {
                acc += v;
                acc
            })
            .collect()
    }
}

/// Fitted threshold-model parameters: direction and ascending thresholds.
#[derive(Debug, Clone)]
pub struct ThresholdParameters {
    pub w: Array1<f64>,
    pub theta: Array1<f64>,
}

/// Per-class threshold weighting selected by the loss mode.
///
/// `AbsoluteError` weights every comparison; `ZeroOne` weights only the
/// thresholds adjacent to the true class (banded, near-tridiagonal).
fn loss_weights(mode: LossMode, n_class: usize) -> Array2<f64> {
    let k = n_class - 1;
    match mode {
        LossMode::AbsoluteError => Array2::ones((n_class, k)),
        LossMode::ZeroOne => {
            let mut weights = Array2::zeros((n_class, k));
            for r in 0..k {
                weights[[r, r]] = 1.0;
                if r > 0 {
                    weights[[r, r - 1]] = 1.0;
                }
            }
            weights[[n_class - 1, k - 1]] = 1.0;
            weights
        }
    }
}

/// The margin surrogate objective. Pure function of the parameters;
/// repeatedly evaluated by the external minimizer.
struct MarginObjective<'a> {
    x: &'a Array2<f64>,
    y: &'a [usize],
    alpha: f64,
    weights: Array2<f64>,
}

impl MarginObjective<'_> {
    /// Mean over samples of the weighted logistic losses on the signed
    /// margins, plus the L2 penalty on w.
    fn loss(&self, params: &MarginParams) -> f64 {
        let scores = self.x.dot(&params.w);
        let theta = params.thresholds();
        let mut total = 0.0;
        for (i, &yi) in self.y.iter().enumerate() {
            for k in 0..theta.len() {
                // sign flip makes correctly ordered margins positive
                let mut margin = theta[k] - scores[i];
                if k < yi {
                    margin = -margin;
                }
                total += self.weights[[yi, k]] * log_loss(margin);
            }
        }
        total / self.x.nrows() as f64 + self.alpha * params.w.dot(&params.w)
    }

    /// Analytic gradient of [`Self::loss`].
    ///
    /// The theta-gradients map to increment space through the chain rule of
    /// the prefix-sum: c_j reaches every threshold from j onward, so
    /// grad_c is the suffix sum of grad_theta.
    fn grad(&self, params: &MarginParams) -> MarginParams {
        let n = self.x.nrows() as f64;
        let scores = self.x.dot(&params.w);
        let theta = params.thresholds();
        let mut grad_w = Array1::<f64>::zeros(params.w.len());
        let mut grad_theta = Array1::<f64>::zeros(theta.len());

        for (i, &yi) in self.y.iter().enumerate() {
            let mut sample_sum = 0.0;
            for k in 0..theta.len() {
                let mut margin = theta[k] - scores[i];
                let mut weight = self.weights[[yi, k]];
                if k < yi {
                    margin = -margin;
                    weight = -weight;
                }
                let term = weight * sigmoid(-margin);
                sample_sum += term;
                grad_theta[k] -= term;
            }
            grad_w.scaled_add(sample_sum, &self.x.row(i));
        }

        grad_w.mapv_inplace(|v| v / n);
        grad_w.scaled_add(2.0 * self.alpha, &params.w);
        grad_theta.mapv_inplace(|v| v / n);

        let mut grad_c = Array1::<f64>::zeros(theta.len());
        let mut suffix = 0.0;
        for j in (0..theta.len()).rev() {
            suffix += grad_theta[j];
            grad_c[j] = suffix;
        }

        MarginParams {
            w: grad_w,
            c: grad_c,
        }
    }
}

impl SmoothObjective for MarginObjective<'_> {
    fn value(&self, flat: &Array1<f64>) -> Result<f64, ModelError> {
        Ok(self.loss(&MarginParams::unpack(flat, self.x.ncols())))
    }

    fn gradient(&self, flat: &Array1<f64>) -> Result<Array1<f64>, ModelError> {
        Ok(self.grad(&MarginParams::unpack(flat, self.x.ncols())).pack())
    }
}

fn sort_ascending(theta: &Array1<f64>) -> Array1<f64> {
    let mut sorted = theta.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Array1::from_vec(sorted)
}

/// Fit the threshold model.
///
/// Initializes w = 0 and c = [0, 1, ..., K-2] (thresholds already
/// ascending). With `bound_increments`, c[1..] is constrained non-negative
/// so the ordering survives optimization structurally. Non-convergence is
/// logged and the best point found is kept. The returned thresholds are
/// sorted ascending on every path.
pub fn threshold_fit(
    x: &Array2<f64>,
    y: &[usize],
    alpha: f64,
    n_class: usize,
    mode: LossMode,
    max_iter: u64,
    bound_increments: bool,
) -> Result<ThresholdParameters, ModelError> {
    validate_fit_inputs(x, y, n_class)?;
    if !(alpha >= 0.0) {
        return Err(ModelError::InvalidInput(format!(
            "alpha must be non-negative, got {}",
            alpha
        )));
    }

    let n_features = x.ncols();
    let objective = MarginObjective {
        x,
        y,
        alpha,
        weights: loss_weights(mode, n_class),
    };

    let start = MarginParams {
        w: Array1::zeros(n_features),
        c: (0..n_class - 1).map(|j| j as f64).collect(),
    };

    let bounds: Option<Vec<Bound>> = if bound_increments {
        let mut b = vec![Bound::Free; n_features + 1];
        b.extend(std::iter::repeat(Bound::LowerBounded(0.0)).take(n_class - 2));
        Some(b)
    } else {
        None
    };

    let solution = minimize_smooth(&objective, &start.pack(), bounds.as_deref(), max_iter)?;
    if !solution.converged {
        log::warn!("threshold fit stopped early: {}", solution.message);
    }
    log::trace!(
        "threshold fit finished after {} iterations at loss {:.6}",
        solution.iterations,
        solution.cost
    );

    let fitted = MarginParams::unpack(&solution.x, n_features);
    Ok(ThresholdParameters {
        theta: sort_ascending(&fitted.thresholds()),
        w: fitted.w,
    })
}

/// Predict class indices: each sample lands in the ordinal interval its
/// score falls into, i.e. the count of thresholds at or below the score.
pub fn threshold_predict(
    x: &Array2<f64>,
    params: &ThresholdParameters,
) -> Result<Vec<usize>, ModelError> {
    validate_feature_count(x, params.w.len())?;
    let theta = sort_ascending(&params.theta);
    let scores = x.dot(&params.w);
    Ok(scores
        .iter()
        .map(|&s| theta.iter().filter(|&&t| t - s <= 0.0).count())
        .collect())
}

/// Threshold-model estimator holding its configuration and, after fit, the
/// learned direction and thresholds.
pub struct ThresholdModel {
    config: ThresholdConfig,
    params: Option<ThresholdParameters>,
}

impl ThresholdModel {
    pub fn new(config: ThresholdConfig) -> Self {
        ThresholdModel {
            config,
            params: None,
        }
    }

    /// Learned parameters, if the model has been fit.
    pub fn params(&self) -> Option<&ThresholdParameters> {
        self.params.as_ref()
    }
}

impl OrdinalEstimator for ThresholdModel {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<&mut Self, ModelError> {
        self.params = Some(threshold_fit(
            x,
            y,
            self.config.alpha,
            self.config.n_class,
            self.config.mode,
            self.config.max_iter,
            self.config.bound_increments,
        )?);
        Ok(self)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>, ModelError> {
        let params = self.params.as_ref().ok_or(ModelError::NotFitted)?;
        threshold_predict(x, params)
    }

    fn score(&self, x: &Array2<f64>, y: &[usize]) -> Result<f64, ModelError> {
        let pred = self.predict(x)?;
        if pred.len() != y.len() {
            return Err(ModelError::InvalidInput(format!(
                "feature matrix has {} rows but y has {} labels",
                pred.len(),
                y.len()
            )));
        }
        Ok(self.config.metric.evaluate(&pred, y))
    }
}
