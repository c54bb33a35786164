use ndarray::Array2;

use crate::error::ModelError;

/// The uniform contract over both ordinal models. This centralizes the
/// fit/predict/score surface in the `models` module so implementations can
/// live next to their objective code.
pub trait OrdinalEstimator {
    /// Fit the model on `x` (n_samples x n_features) and labels `y` in
    /// [0, n_class-1]. Stores the learned parameters and returns self so
    /// calls can be chained.
    fn fit(&mut self, x: &Array2<f64>, y: &[usize]) -> Result<&mut Self, ModelError>;

    /// Predict class indices for `x`. Pure function over the stored
    /// parameters; errors if called before `fit`.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<usize>, ModelError>;

    /// Score predictions on `x` against `y` with the estimator's configured
    /// metric. Higher is better.
    fn score(&self, x: &Array2<f64>, y: &[usize]) -> Result<f64, ModelError>;
}
