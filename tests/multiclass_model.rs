use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ordmargin::config::{CostMatrix, MulticlassConfig};
use ordmargin::error::ModelError;
use ordmargin::metrics::{mean_absolute_error, OrdinalMetric};
use ordmargin::models::estimator::OrdinalEstimator;
use ordmargin::models::multiclass::{multiclass_fit, multiclass_predict, MulticlassModel};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Three well-separated clusters along the first feature.
fn separable_clusters(seed: u64, per_class: usize) -> (Array2<f64>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = per_class * 3;
    let mut data = Vec::with_capacity(n * 2);
    let mut y = Vec::with_capacity(n);
    for class in 0..3usize {
        let center = class as f64 * 4.0 - 4.0; // -4, 0, 4
        for _ in 0..per_class {
            data.push(center + rng.gen_range(-0.5..0.5));
            data.push(rng.gen_range(-0.5..0.5));
            y.push(class);
        }
    }
    (Array2::from_shape_vec((n, 2), data).unwrap(), y)
}

#[test]
fn test_scoring_matrix_columns_sum_to_zero() {
    init_logging();
    let (x, y) = separable_clusters(0, 10);
    let w = multiclass_fit(&x, &y, 0.01, 3, 1000, 1, CostMatrix::Uniform, Some(0))
        .expect("fit failed");

    assert_eq!(w.shape(), &[3, 3]);
    // the n_class column vectors sum to zero, entry by entry
    for r in 0..w.nrows() {
        let sum: f64 = w.row(r).sum();
        assert!(sum.abs() < 1e-6, "feature row {} sums to {}", r, sum);
    }
}

#[test]
fn test_fit_separates_easy_clusters() {
    init_logging();
    let (x, y) = separable_clusters(1, 12);
    let w = multiclass_fit(&x, &y, 0.001, 3, 2000, 1, CostMatrix::Uniform, Some(1))
        .expect("fit failed");
    let pred = multiclass_predict(&x, &w).expect("predict failed");

    assert!(pred.iter().all(|&p| p < 3));
    let mae = mean_absolute_error(&pred, &y);
    // random labels would land near 0.89 MAE on three balanced classes
    assert!(mae < 0.5, "training MAE too high: {}", mae);
}

#[test]
fn test_ordinal_distance_cost_fits() {
    init_logging();
    let (x, y) = separable_clusters(2, 8);
    let w = multiclass_fit(&x, &y, 0.01, 3, 800, 0, CostMatrix::OrdinalDistance, Some(2))
        .expect("fit failed");
    assert_eq!(w.shape(), &[3, 3]);
    let pred = multiclass_predict(&x, &w).expect("predict failed");
    assert!(pred.iter().all(|&p| p < 3));
}

#[test]
fn test_predictions_stay_in_range_on_arbitrary_inputs() {
    init_logging();
    let (x, y) = separable_clusters(3, 8);
    let w = multiclass_fit(&x, &y, 0.01, 3, 500, 1, CostMatrix::Uniform, Some(3))
        .expect("fit failed");

    let mut rng = StdRng::seed_from_u64(42);
    let wild = Array2::from_shape_fn((40, 2), |_| rng.gen_range(-1e3..1e3));
    let pred = multiclass_predict(&wild, &w).expect("predict failed");
    assert!(pred.iter().all(|&p| p < 3));
}

#[test]
fn test_estimator_surface() {
    init_logging();
    let (x, y) = separable_clusters(4, 10);

    let mut config = MulticlassConfig::new(3, 0.001);
    config.max_iter = 2000;
    config.metric = OrdinalMetric::ZeroOneLoss;
    config.seed = Some(4);

    let mut model = MulticlassModel::new(config);
    model.fit(&x, &y).expect("fit failed");
    assert!(model.scoring_matrix().is_some());

    let pred = model.predict(&x).expect("predict failed");
    assert_eq!(pred.len(), y.len());

    let score = model.score(&x, &y).expect("score failed");
    // zero-one metric: negated fraction of misclassified samples
    assert!((-1.0..=0.0).contains(&score));
}

#[test]
fn test_invalid_inputs_fail_fast() {
    let x = Array2::<f64>::zeros((4, 2));

    assert!(matches!(
        multiclass_fit(&x, &[0, 1, 3, 1], 0.1, 3, 10, 0, CostMatrix::Uniform, Some(0)),
        Err(ModelError::InvalidInput(_))
    ));
    assert!(matches!(
        multiclass_fit(&x, &[0, 1], 0.1, 2, 10, 0, CostMatrix::Uniform, Some(0)),
        Err(ModelError::InvalidInput(_))
    ));

    let model = MulticlassModel::new(MulticlassConfig::default());
    assert!(matches!(model.predict(&x), Err(ModelError::NotFitted)));
}
