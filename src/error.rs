//! Error types for Cancha operations.
//!
//! All numeric-core failures degrade to documented neutral values; the
//! variants here cover the cases a caller genuinely has to handle.

use std::fmt;

/// Main error type for Cancha operations.
///
/// # Examples
///
/// ```
/// use cancha::error::CanchaError;
///
/// let err = CanchaError::InsufficientData {
///     found: 2,
///     required: 3,
///     suggestion: "need more feedback".to_string(),
/// };
/// assert!(err.to_string().contains("Insufficient data"));
/// ```
#[derive(Debug)]
pub enum CanchaError {
    /// Not enough records to run the requested computation.
    InsufficientData {
        /// Number of records available
        found: usize,
        /// Minimum number required
        required: usize,
        /// Suggested remediation for the caller
        suggestion: String,
    },

    /// Matrix/vector dimensions don't match for the operation.
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Invalid hyperparameter value provided.
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Generic error with string message.
    Other(String),
}

impl fmt::Display for CanchaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanchaError::InsufficientData {
                found,
                required,
                suggestion,
            } => {
                write!(
                    f,
                    "Insufficient data: found {found}, need at least {required} ({suggestion})"
                )
            }
            CanchaError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {expected}, got {actual}")
            }
            CanchaError::InvalidHyperparameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid hyperparameter: {param} = {value}, expected {constraint}"
                )
            }
            CanchaError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for CanchaError {}

impl From<&str> for CanchaError {
    fn from(msg: &str) -> Self {
        CanchaError::Other(msg.to_string())
    }
}

impl From<String> for CanchaError {
    fn from(msg: String) -> Self {
        CanchaError::Other(msg)
    }
}

impl CanchaError {
    /// Create a dimension mismatch error with descriptive context
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Create an insufficient data error with a remediation hint.
    #[must_use]
    pub fn insufficient_data(found: usize, required: usize, suggestion: &str) -> Self {
        Self::InsufficientData {
            found,
            required,
            suggestion: suggestion.to_string(),
        }
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, CanchaError>;
