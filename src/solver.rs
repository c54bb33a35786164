//! Adapter around the external numerical minimizer.
//!
//! The models in this crate never talk to the optimizer directly; they hand
//! an objective (with or without an analytic gradient), an initial point, an
//! optional set of per-coordinate bounds and an iteration cap to this module
//! and get back the best point found plus a convergence flag and diagnostic
//! message. Smooth objectives run under L-BFGS with a More-Thuente line
//! search; gradient-free objectives run under Nelder-Mead.
//!
//! argmin's quasi-Newton solvers are unconstrained, so lower bounds are
//! honored by a smooth change of variables: a bounded coordinate x is
//! optimized as a raw coordinate u with x = lb + softplus(u), and the
//! chain-rule factor sigmoid(u) is folded into the gradient. The transform
//! never leaves this module; callers see the box-bound contract only.
use std::cell::RefCell;

use argmin::core::{CostFunction, Error, Executor, Gradient, State, TerminationReason, TerminationStatus};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::neldermead::NelderMead;
use argmin::solver::quasinewton::LBFGS;
use ndarray::Array1;

use crate::error::ModelError;
use crate::math::{sigmoid, softplus, softplus_inv};

/// L-BFGS history size.
const LBFGS_MEMORY: usize = 7;

/// Standard-deviation tolerance for Nelder-Mead termination.
const SD_TOLERANCE: f64 = 1e-10;

/// Per-coordinate constraint handed to [`minimize_smooth`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Free,
    LowerBounded(f64),
}

/// Result of a minimizer run.
///
/// `converged` reports the solver's own success flag; a false value still
/// carries the best point found, per the best-effort contract.
#[derive(Debug, Clone)]
pub struct Solution {
    pub x: Array1<f64>,
    pub cost: f64,
    pub iterations: u64,
    pub converged: bool,
    pub message: String,
}

/// Objective with an analytic gradient, minimized by L-BFGS.
pub trait SmoothObjective {
    fn value(&self, x: &Array1<f64>) -> Result<f64, ModelError>;
    fn gradient(&self, x: &Array1<f64>) -> Result<Array1<f64>, ModelError>;
}

/// Objective evaluated by value only, minimized by Nelder-Mead.
pub trait BlackBoxObjective {
    fn value(&self, x: &Array1<f64>) -> Result<f64, ModelError>;
}

/// Map an external (possibly bounded) point to raw coordinates.
fn to_internal(x: &Array1<f64>, bounds: &[Bound]) -> Array1<f64> {
    x.iter()
        .zip(bounds.iter())
        .map(|(&v, b)| match b {
            Bound::Free => v,
            Bound::LowerBounded(lb) => softplus_inv(v - lb),
        })
        .collect()
}

/// Map raw coordinates back to the external space.
fn to_external(u: &Array1<f64>, bounds: &[Bound]) -> Array1<f64> {
    u.iter()
        .zip(bounds.iter())
        .map(|(&v, b)| match b {
            Bound::Free => v,
            Bound::LowerBounded(lb) => lb + softplus(v),
        })
        .collect()
}

/// Chain the external gradient through the bound transform.
fn chain_gradient(grad: &mut Array1<f64>, u: &Array1<f64>, bounds: &[Bound]) {
    for ((g, &v), b) in grad.iter_mut().zip(u.iter()).zip(bounds.iter()) {
        if let Bound::LowerBounded(_) = b {
            *g *= sigmoid(v);
        }
    }
}

/// Bridges a [`SmoothObjective`] to argmin, applying the bound transform and
/// capturing the first objective failure so it can be re-raised after the
/// solver aborts.
struct SmoothProblem<'a, F> {
    objective: &'a F,
    bounds: Option<&'a [Bound]>,
    failure: &'a RefCell<Option<ModelError>>,
}

impl<'a, F: SmoothObjective> SmoothProblem<'a, F> {
    fn external(&self, u: &Array1<f64>) -> Array1<f64> {
        match self.bounds {
            Some(b) => to_external(u, b),
            None => u.clone(),
        }
    }

    fn capture(&self, err: ModelError) -> Error {
        capture_failure(self.failure, err)
    }
}

impl<'a, F: SmoothObjective> CostFunction for SmoothProblem<'a, F> {
    type Param = Array1<f64>;
    type Output = f64;

    fn cost(&self, u: &Self::Param) -> Result<Self::Output, Error> {
        let x = self.external(u);
        match self.objective.value(&x) {
            Ok(v) if v.is_finite() => Ok(v),
            Ok(v) => Err(self.capture(ModelError::NumericalInstability(format!(
                "objective evaluated to {}",
                v
            )))),
            Err(e) => Err(self.capture(e)),
        }
    }
}

impl<'a, F: SmoothObjective> Gradient for SmoothProblem<'a, F> {
    type Param = Array1<f64>;
    type Gradient = Array1<f64>;

    fn gradient(&self, u: &Self::Param) -> Result<Self::Gradient, Error> {
        let x = self.external(u);
        match self.objective.gradient(&x) {
            Ok(mut g) => {
                if let Some(b) = self.bounds {
                    chain_gradient(&mut g, u, b);
                }
                if g.iter().any(|v| !v.is_finite()) {
                    return Err(self.capture(ModelError::NumericalInstability(
                        "gradient contains non-finite entries".to_string(),
                    )));
                }
                Ok(g)
            }
            Err(e) => Err(self.capture(e)),
        }
    }
}

/// Bridges a [`BlackBoxObjective`] to argmin's cost-only interface.
struct BlackBoxProblem<'a, F> {
    objective: &'a F,
    failure: &'a RefCell<Option<ModelError>>,
}

impl<'a, F: BlackBoxObjective> CostFunction for BlackBoxProblem<'a, F> {
    type Param = Array1<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, Error> {
        match self.objective.value(x) {
            Ok(v) if v.is_finite() => Ok(v),
            Ok(v) => Err(capture_failure(
                self.failure,
                ModelError::NumericalInstability(format!("objective evaluated to {}", v)),
            )),
            Err(e) => Err(capture_failure(self.failure, e)),
        }
    }
}

/// Record the first objective failure and hand argmin an opaque abort error.
fn capture_failure(slot: &RefCell<Option<ModelError>>, err: ModelError) -> Error {
    let mut slot = slot.borrow_mut();
    if slot.is_none() {
        *slot = Some(err);
    }
    ModelError::NumericalInstability("objective evaluation failed".to_string()).into_argmin()
}

fn summarize(status: &TerminationStatus) -> (bool, String) {
    match status {
        TerminationStatus::Terminated(reason) => match reason {
            TerminationReason::SolverConverged | TerminationReason::TargetCostReached => {
                (true, format!("{:?}", reason))
            }
            other => (false, format!("{:?}", other)),
        },
        TerminationStatus::NotTerminated => (false, "solver did not terminate".to_string()),
    }
}

/// Minimize a smooth objective with its analytic gradient under L-BFGS.
///
/// `bounds`, when present, must carry one entry per coordinate of `x0`.
/// Non-convergence is reported through [`Solution::converged`], never as an
/// error; objective failures (non-finite values) are fatal.
pub fn minimize_smooth<F: SmoothObjective>(
    objective: &F,
    x0: &Array1<f64>,
    bounds: Option<&[Bound]>,
    max_iter: u64,
) -> Result<Solution, ModelError> {
    if let Some(b) = bounds {
        if b.len() != x0.len() {
            return Err(ModelError::InvalidInput(format!(
                "bounds length {} does not match parameter length {}",
                b.len(),
                x0.len()
            )));
        }
    }

    let failure = RefCell::new(None);
    let problem = SmoothProblem {
        objective,
        bounds,
        failure: &failure,
    };
    let u0 = match bounds {
        Some(b) => to_internal(x0, b),
        None => x0.clone(),
    };
    let u0_fallback = u0.clone();

    let linesearch: MoreThuenteLineSearch<Array1<f64>, Array1<f64>, f64> =
        MoreThuenteLineSearch::new();
    let lbfgs: LBFGS<_, Array1<f64>, Array1<f64>, f64> = LBFGS::new(linesearch, LBFGS_MEMORY);

    let run = Executor::new(problem, lbfgs)
        .configure(|state| state.param(u0).max_iters(max_iter))
        .run();

    match run {
        Ok(result) => {
            let mut state = result.state().clone();
            let iterations = state.get_iter();
            let cost = state.get_best_cost();
            let (converged, message) = summarize(state.get_termination_status());
            let best_u = state.take_best_param().unwrap_or(u0_fallback);
            let x = match bounds {
                Some(b) => to_external(&best_u, b),
                None => best_u,
            };
            Ok(Solution {
                x,
                cost,
                iterations,
                converged,
                message,
            })
        }
        Err(e) => {
            if let Some(err) = failure.borrow_mut().take() {
                return Err(err);
            }
            // Solver-internal failure (e.g. line search breakdown): degrade
            // to a best-effort result carrying the initial point.
            Ok(Solution {
                x: x0.clone(),
                cost: f64::INFINITY,
                iterations: 0,
                converged: false,
                message: format!("solver aborted: {}", e),
            })
        }
    }
}

/// Build the initial Nelder-Mead simplex around `x0` by perturbing one
/// coordinate per vertex.
fn build_simplex(x0: &Array1<f64>) -> Vec<Array1<f64>> {
    let mut simplex = Vec::with_capacity(x0.len() + 1);
    simplex.push(x0.clone());
    for i in 0..x0.len() {
        let mut vertex = x0.clone();
        vertex[i] = if vertex[i] != 0.0 {
            vertex[i] * 1.05
        } else {
            2.5e-4
        };
        simplex.push(vertex);
    }
    simplex
}

/// Minimize a gradient-free objective with Nelder-Mead.
///
/// The caller owns restart policy: each call runs a single simplex search
/// from `x0`.
pub fn minimize_simplex<F: BlackBoxObjective>(
    objective: &F,
    x0: &Array1<f64>,
    max_iter: u64,
) -> Result<Solution, ModelError> {
    if x0.is_empty() {
        return Err(ModelError::InvalidInput(
            "cannot minimize over an empty parameter vector".to_string(),
        ));
    }

    let failure = RefCell::new(None);
    let problem = BlackBoxProblem {
        objective,
        failure: &failure,
    };

    let configured = NelderMead::new(build_simplex(x0)).with_sd_tolerance(SD_TOLERANCE);
    let nelder_mead: NelderMead<Array1<f64>, f64> = match configured {
        Ok(solver) => solver,
        Err(e) => {
            return Err(ModelError::InvalidInput(format!(
                "solver rejected configuration: {}",
                e
            )))
        }
    };

    let run = Executor::new(problem, nelder_mead)
        .configure(|state| state.max_iters(max_iter))
        .run();

    match run {
        Ok(result) => {
            let mut state = result.state().clone();
            let iterations = state.get_iter();
            let cost = state.get_best_cost();
            let (converged, message) = summarize(state.get_termination_status());
            let x = state.take_best_param().unwrap_or_else(|| x0.clone());
            Ok(Solution {
                x,
                cost,
                iterations,
                converged,
                message,
            })
        }
        Err(e) => {
            if let Some(err) = failure.borrow_mut().take() {
                return Err(err);
            }
            Ok(Solution {
                x: x0.clone(),
                cost: f64::INFINITY,
                iterations: 0,
                converged: false,
                message: format!("solver aborted: {}", e),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    struct Quadratic {
        center: Array1<f64>,
    }

    impl SmoothObjective for Quadratic {
        fn value(&self, x: &Array1<f64>) -> Result<f64, ModelError> {
            Ok((x - &self.center).mapv(|d| d * d).sum())
        }

        fn gradient(&self, x: &Array1<f64>) -> Result<Array1<f64>, ModelError> {
            Ok((x - &self.center).mapv(|d| 2.0 * d))
        }
    }

    impl BlackBoxObjective for Quadratic {
        fn value(&self, x: &Array1<f64>) -> Result<f64, ModelError> {
            SmoothObjective::value(self, x)
        }
    }

    #[test]
    fn test_minimize_smooth_unbounded() {
        let objective = Quadratic {
            center: array![3.0, -2.0],
        };
        let sol = minimize_smooth(&objective, &array![0.0, 0.0], None, 500).unwrap();
        assert!((sol.x[0] - 3.0).abs() < 1e-5, "x = {:?}", sol.x);
        assert!((sol.x[1] + 2.0).abs() < 1e-5, "x = {:?}", sol.x);
    }

    #[test]
    fn test_minimize_smooth_respects_lower_bound() {
        // unconstrained minimum at (3, -2); bound keeps x1 >= 0
        let objective = Quadratic {
            center: array![3.0, -2.0],
        };
        let bounds = [Bound::Free, Bound::LowerBounded(0.0)];
        let sol = minimize_smooth(&objective, &array![0.5, 1.0], Some(&bounds), 500).unwrap();
        assert!((sol.x[0] - 3.0).abs() < 1e-3, "x = {:?}", sol.x);
        assert!(sol.x[1] >= 0.0, "bound violated: {:?}", sol.x);
        assert!(sol.x[1] < 1e-2, "x = {:?}", sol.x);
    }

    #[test]
    fn test_minimize_smooth_reports_non_finite_loss() {
        struct Broken;
        impl SmoothObjective for Broken {
            fn value(&self, _x: &Array1<f64>) -> Result<f64, ModelError> {
                Ok(f64::NAN)
            }
            fn gradient(&self, x: &Array1<f64>) -> Result<Array1<f64>, ModelError> {
                Ok(Array1::zeros(x.len()))
            }
        }
        let err = minimize_smooth(&Broken, &array![0.0], None, 10).unwrap_err();
        assert!(matches!(err, ModelError::NumericalInstability(_)));
    }

    #[test]
    fn test_minimize_simplex_quadratic() {
        let objective = Quadratic {
            center: array![1.0, 2.0],
        };
        let sol = minimize_simplex(&objective, &array![0.0, 0.0], 2000).unwrap();
        assert!((sol.x[0] - 1.0).abs() < 1e-3, "x = {:?}", sol.x);
        assert!((sol.x[1] - 2.0).abs() < 1e-3, "x = {:?}", sol.x);
    }

    #[test]
    fn test_bound_transform_roundtrip() {
        let bounds = [Bound::Free, Bound::LowerBounded(0.0), Bound::LowerBounded(-1.0)];
        let x = array![-4.0, 2.0, 0.5];
        let u = to_internal(&x, &bounds);
        let back = to_external(&u, &bounds);
        for (a, b) in x.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
