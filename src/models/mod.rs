pub mod estimator;
pub mod multiclass;
pub mod threshold;

use ndarray::Array2;

use crate::error::ModelError;

/// Shared entry validation for both fit routines. Label range was
/// historically assumed; it is checked here so malformed inputs fail fast.
pub(crate) fn validate_fit_inputs(
    x: &Array2<f64>,
    y: &[usize],
    n_class: usize,
) -> Result<(), ModelError> {
    if n_class < 2 {
        return Err(ModelError::InvalidInput(format!(
            "n_class must be at least 2, got {}",
            n_class
        )));
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ModelError::InvalidInput(
            "feature matrix must have at least one sample and one feature".to_string(),
        ));
    }
    if x.nrows() != y.len() {
        return Err(ModelError::InvalidInput(format!(
            "feature matrix has {} rows but y has {} labels",
            x.nrows(),
            y.len()
        )));
    }
    if let Some(&bad) = y.iter().find(|&&label| label >= n_class) {
        return Err(ModelError::InvalidInput(format!(
            "label {} outside [0, {}]",
            bad,
            n_class - 1
        )));
    }
    Ok(())
}

/// Check that a prediction matrix matches the feature count seen at fit.
pub(crate) fn validate_feature_count(x: &Array2<f64>, expected: usize) -> Result<(), ModelError> {
    if x.ncols() != expected {
        return Err(ModelError::InvalidInput(format!(
            "feature matrix has {} columns but the model was fit with {}",
            x.ncols(),
            expected
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_validate_fit_inputs() {
        let x = Array2::<f64>::zeros((3, 2));
        assert!(validate_fit_inputs(&x, &[0, 1, 2], 3).is_ok());
        assert!(validate_fit_inputs(&x, &[0, 1], 3).is_err());
        assert!(validate_fit_inputs(&x, &[0, 1, 3], 3).is_err());
        assert!(validate_fit_inputs(&x, &[0, 0, 0], 1).is_err());
        let empty = Array2::<f64>::zeros((0, 2));
        assert!(validate_fit_inputs(&empty, &[], 2).is_err());
    }

    #[test]
    fn test_validate_feature_count() {
        let x = Array2::<f64>::zeros((3, 4));
        assert!(validate_feature_count(&x, 4).is_ok());
        assert!(validate_feature_count(&x, 2).is_err());
    }
}
