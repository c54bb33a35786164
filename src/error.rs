use std::error::Error;
use std::fmt;

/// Custom error type for model fitting and prediction failures
#[derive(Debug)]
pub enum ModelError {
    InvalidInput(String),
    NotFitted,
    NumericalInstability(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            ModelError::NotFitted => write!(f, "predict called before fit"),
            ModelError::NumericalInstability(msg) => {
                write!(f, "numerical instability: {}", msg)
            }
        }
    }
}

impl Error for ModelError {}

impl ModelError {
    /// Wrap into an argmin error so objective failures abort a solver run.
    pub(crate) fn into_argmin(self) -> argmin::core::Error {
        anyhow::Error::new(self)
    }
}
