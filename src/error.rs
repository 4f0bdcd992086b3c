//! Error types for capas operations.
//!
//! Provides rich error context for library consumers.

use std::fmt;

use crate::dtype::DType;

/// Main error type for capas operations.
///
/// All failures here are programming-contract violations, not operational
/// faults: they surface immediately to the caller and are never retried.
///
/// # Examples
///
/// ```
/// use capas::error::CapasError;
///
/// let err = CapasError::ShapeMismatch {
///     expected: "[2, 4]".to_string(),
///     actual: "[2, 5]".to_string(),
/// };
/// assert!(err.to_string().contains("shape mismatch"));
/// ```
#[derive(Debug)]
pub enum CapasError {
    /// Axis sizes implied by a contraction expression or broadcast disagree
    /// with the operand shapes, or a stored parameter's shape/dtype disagrees
    /// with the requested one.
    ShapeMismatch {
        /// Expected shape description
        expected: String,
        /// Actual shape found
        actual: String,
    },

    /// Precision reduction invoked on a non-floating-point tensor.
    UnknownType {
        /// The offending dtype
        dtype: DType,
    },

    /// Malformed einsum equation.
    InvalidEquation {
        /// The equation as given
        eqn: String,
        /// What is wrong with it
        reason: String,
    },
}

impl fmt::Display for CapasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapasError::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected}, got {actual}")
            }
            CapasError::UnknownType { dtype } => {
                write!(
                    f,
                    "precision reduction is undefined for non-float dtype {dtype:?}"
                )
            }
            CapasError::InvalidEquation { eqn, reason } => {
                write!(f, "invalid einsum equation '{eqn}': {reason}")
            }
        }
    }
}

impl std::error::Error for CapasError {}

/// Result type alias for capas operations.
pub type Result<T> = std::result::Result<T, CapasError>;
