use ndarr_tensor::{DType, TensorError};
use thiserror::Error;

/// An error type for tensor operations.
#[derive(Error, Debug, PartialEq)]
pub enum OpsError {
    /// Error bubbled up from the tensor core.
    #[error("Error with the tensor: {0}")]
    Tensor(#[from] TensorError),

    /// Operand shapes are neither equal nor broadcast-compatible.
    #[error("Shape mismatch: {0:?} != {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// Operation flagged floating-point-only invoked on an integral dtype.
    #[error("Operation `{operation}` is only available for floating point dtypes, got {dtype:?}")]
    UnsupportedDType {
        /// Name of the operation that was attempted.
        operation: String,
        /// The dtype it was attempted on.
        dtype: DType,
    },

    /// A reduction over zero elements has no defined value.
    #[error("Reduction `{0}` is undefined for an empty tensor")]
    EmptyReduction(String),

    /// A precondition on an argument does not hold.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl OpsError {
    /// Creates an `UnsupportedDType` error with context.
    pub fn unsupported_dtype(operation: impl Into<String>, dtype: DType) -> Self {
        Self::UnsupportedDType {
            operation: operation.into(),
            dtype,
        }
    }

    /// Creates an `InvalidArgument` error from any message.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}
