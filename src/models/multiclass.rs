//! Multiclass margin model with an absolute-error-flavored surrogate.
//!
//! An affine scoring matrix W maps each (bias-augmented) sample to K scores.
//! Columns of W sum to zero: only K-1 columns are free and the last is
//! derived as their negated sum, removing the redundant degree of freedom.
//! Training minimizes a hinge-style loss against the +1 / -1/(K-1) target
//! encoding. The objective is not smooth, so the external minimizer runs
//! gradient-free, with chained restarts as a convergence heuristic.
use ndarray::{s, Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{CostMatrix, MulticlassConfig};
use crate::error::ModelError;
use crate::models::estimator::OrdinalEstimator;
use crate::models::{validate_feature_count, validate_fit_inputs};
use crate::solver::{minimize_simplex, BlackBoxObjective};

/// Optimizer-facing parameter block: the free (n_features+1) x (K-1) slice
/// of the scoring matrix. The sum-to-zero column is derived, never stored.
#[derive(Debug, Clone)]
pub struct ScoringParams {
    pub free: Array2<f64>,
}

impl ScoringParams {
    fn unpack(flat: &Array1<f64>, rows: usize, cols: usize) -> Result<Self, ModelError> {
        let free = Array2::from_shape_vec((rows, cols), flat.to_vec()).map_err(|_| {
            ModelError::InvalidInput(format!(
                "parameter vector of length {} does not fill a {}x{} matrix",
                flat.len(),
                rows,
                cols
            ))
        })?;
        Ok(Self { free })
    }

    fn pack(&self) -> Array1<f64> {
        Array1::from_iter(self.free.iter().copied())
    }

    /// Full scoring matrix with the derived final column, so the n_class
    /// column vectors sum to zero.
    pub fn full_matrix(&self) -> Array2<f64> {
        let rows = self.free.nrows();
        let cols = self.free.ncols();
        let mut w = Array2::zeros((rows, cols + 1));
        for r in 0..rows {
            let mut row_sum = 0.0;
            for c in 0..cols {
                w[[r, c]] = self.free[[r, c]];
                row_sum += self.free[[r, c]];
            }
            w[[r, cols]] = -row_sum;
        }
        w
    }
}

/// Cost applied to each wrong-class hinge term.
fn cost_matrix(kind: CostMatrix, n_class: usize) -> Array2<f64> {
    Array2::from_shape_fn((n_class, n_class), |(a, b)| match kind {
        CostMatrix::Uniform => {
            if a == b {
                0.0
            } else {
                1.0
            }
        }
        CostMatrix::OrdinalDistance => (a as f64 - b as f64).abs(),
    })
}

fn append_bias(x: &Array2<f64>) -> Array2<f64> {
    let (n, d) = (x.nrows(), x.ncols());
    let mut xb = Array2::ones((n, d + 1));
    xb.slice_mut(s![.., ..d]).assign(x);
    xb
}

/// The multiclass hinge surrogate. Evaluated by value only; the kink at the
/// hinge makes an analytic gradient unavailable.
struct MulticlassObjective<'a> {
    xb: &'a Array2<f64>,
    y: &'a [usize],
    alpha: f64,
    n_class: usize,
    cost: Array2<f64>,
}

impl MulticlassObjective<'_> {
    fn loss(&self, params: &ScoringParams) -> f64 {
        let w = params.full_matrix();
        let scores = self.xb.dot(&w);
        let negative_target = -1.0 / (self.n_class as f64 - 1.0);

        let mut total = 0.0;
        for (i, &yi) in self.y.iter().enumerate() {
            for k in 0..self.n_class {
                let target = if k == yi { 1.0 } else { negative_target };
                let slack = scores[[i, k]] - target;
                if slack > 0.0 {
                    total += self.cost[[yi, k]] * slack;
                }
            }
        }

        // the bias row carries no penalty
        let mut penalty = 0.0;
        for r in 0..w.nrows() - 1 {
            for k in 0..w.ncols() {
                penalty += w[[r, k]] * w[[r, k]];
            }
        }

        total / self.xb.nrows() as f64 + self.alpha * penalty
    }
}

impl BlackBoxObjective for MulticlassObjective<'_> {
    fn value(&self, flat: &Array1<f64>) -> Result<f64, ModelError> {
        let params = ScoringParams::unpack(flat, self.xb.ncols(), self.n_class - 1)?;
        Ok(self.loss(&params))
    }
}

/// Fit the multiclass margin model.
///
/// The free block is randomly initialized (seedable), then minimized
/// gradient-free `restarts + 1` times, each run restarting from the
/// previous best point. Returns the full (n_features+1) x n_class scoring
/// matrix with columns summing to zero.
pub fn multiclass_fit(
    x: &Array2<f64>,
    y: &[usize],
    alpha: f64,
    n_class: usize,
    max_iter: u64,
    restarts: usize,
    cost: CostMatrix,
    seed: Option<u64>,
) -> Result<Array2<f64>, ModelError> {
    validate_fit_inputs(x, y, n_class)?;
    if !(alpha >= 0.0) {
        return Err(ModelError::InvalidInput(format!(
            "alpha must be non-negative, got {}",
            alpha
        )));
    }

    let xb = append_bias(x);
    let objective = MulticlassObjective {
        xb: &xb,
        y,
        alpha,
        n_class,
        cost: cost_matrix(cost, n_class),
    };

    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    let start = ScoringParams {
        free: Array2::from_shape_fn((xb.ncols(), n_class - 1), |_| rng.gen_range(-1.0..1.0)),
    };
    let mut point = start.pack();

    for run in 0..=restarts {
        let solution = minimize_simplex(&objective, &point, max_iter)?;
        if !solution.converged {
            log::warn!(
                "multiclass fit run {} stopped early: {}",
                run,
                solution.message
            );
        }
        log::trace!(
            "multiclass fit run {} finished after {} iterations at loss {:.6}",
            run,
            solution.iterations,
            solution.cost
        );
        point = solution.x;
    }

    let params = ScoringParams::unpack(&point, xb.ncols(), n_class - 1)?;
    Ok(params.full_matrix())
}

/// Predict class indices as the argmax of the bias-augmented scores.
pub fn multiclass_predict(x: &Array2<f64>, w: &Array2<f64>) -> Result<Vec<usize>, ModelError> {
    if w.nrows() < 2 || w.ncols() < 2 {
        return Err(ModelError::InvalidInput(format!(
            "scoring matrix of shape {}x{} is too small",
            w.nrows(),
            w.ncols()
        )));
    }
    validate_feature_count(x, w.nrows() - 1)?;
    let scores = append_bias(x).dot(w);
    Ok((0..scores.nrows())
        .map(|i| {
            let row = scores.row(i);
            let mut best = 0;
            for (k, &v) in row.iter().enumerate() {
                if v > row[best] {
                    best = k;
                }
            }
            best
        })
        .collect())
}

/// Multiclass-model estimator holding its configuration and, after fit, the
/// learned scoring matrix.
pub struct MulticlassModel {
    config: MulticlassConfig,
    scoring: Option<Array2<f64>>,
}

impl MulticlassModel {
    pub fn new(config: MulticlassConfig) -> Self {
        MulticlassModel {
            config,
            scoring: None,
        }
    }

    /// Learned scoring matrix, if the model has been fit.
    pub fn scoring_matrix(&self) -> Option<&Array2<f64>> {
        self.scoring.as_ref()
    }
}

impl OrdinalEstimator for MulticlassModel {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<&mut Self, ModelError> {
        self.scoring = Some(multiclass_fit(
            x,
            y,
            self.config.alpha,
            self.config.n_class,
            self.config.max_iter,
            self.config.restarts,
            self.config.cost,
            self.config.seed,
        )?);
        Ok(self)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>, ModelError> {
        let scoring = self.scoring.as_ref().ok_or(ModelError::NotFitted)?;
        multiclass_predict(x, scoring)
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
