//! Overflow-safe numeric primitives used by the loss functions.
//!
//! Provides the stable logistic/softplus family shared by the margin
//! objective and the solver's bound transform. These functions are
//! intentionally small and dependency-free so they are easy to test in
//! isolation.
pub mod stable;

pub use stable::{log_loss, sigmoid, softplus, softplus_inv};
