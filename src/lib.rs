//! ordmargin: margin-based ordinal regression models.
//!
//! This crate provides two linear models for ordinal classification: a
//! threshold (cut-point) model trained with a smooth logistic surrogate and
//! an analytic gradient, and a multiclass margin model trained with a
//! gradient-free hinge-style surrogate under a sum-to-zero identifiability
//! constraint. Both expose a uniform fit/predict/score surface.
//!
//! The design favors small, testable modules: the numerical minimizer is an
//! external collaborator reached only through the `solver` adapter, and
//! scoring metrics are pluggable per estimator instance.
pub mod config;
pub mod error;
pub mod math;
pub mod metrics;
pub mod models;
pub mod solver;
