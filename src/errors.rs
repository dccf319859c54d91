use std::fmt;

/// Error returned by model construction, training and inference entry points.
///
/// All errors are fatal at the call that raised them; the model never retries
/// internally. A test instance that no rule matches is not an error, it yields
/// the `f64::NAN` no-prediction sentinel instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElcsError {
    /// A hyperparameter is out of range or inconsistent, raised by the builder
    /// (or at `fit` for parameters that depend on the data shape).
    InvalidHyperparameter(String),
    /// Training or test data is malformed (ragged rows, non-finite values,
    /// missing targets), raised at `fit`/`predict` entry.
    InvalidInput(String),
    /// An operation was called in the wrong lifecycle phase, e.g. `fit` on an
    /// already trained model or `predict` on an untrained one.
    IllegalState(String),
}

impl fmt::Display for ElcsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElcsError::InvalidHyperparameter(details) => {
                write!(f, "invalid hyperparameter: {}", details)
            }
            ElcsError::InvalidInput(details) => write!(f, "invalid input: {}", details),
            ElcsError::IllegalState(details) => write!(f, "illegal state: {}", details),
        }
    }
}

impl std::error::Error for ElcsError {}
