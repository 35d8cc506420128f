use thiserror::Error;

use crate::dtype::DType;

/// An error type for tensor creation, layout and access operations.
#[derive(Error, Debug, PartialEq)]
pub enum TensorError {
    /// Tensor shape does not match the provided data.
    ///
    /// The product of the shape dimensions must equal the number of elements
    /// in the data exactly.
    #[error("Shape mismatch: expected {expected} elements for shape, but got {actual} elements in data")]
    InvalidShape {
        /// Expected number of elements based on shape.
        expected: usize,
        /// Actual number of elements in the data.
        actual: usize,
    },

    /// Index exceeds tensor bounds.
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index that was attempted.
        index: usize,
        /// The size of the dimension being indexed.
        size: usize,
    },

    /// Axis exceeds the tensor rank.
    #[error("Axis {axis} out of bounds for tensor of rank {rank}")]
    AxisOutOfBounds {
        /// The invalid axis that was attempted.
        axis: usize,
        /// The rank of the tensor.
        rank: usize,
    },

    /// Tensor dimensions incompatible for the requested operation.
    ///
    /// Raised before any work begins; the operands are left untouched.
    #[error("Dimension mismatch: {message}. Expected shape: {expected}, got: {actual}")]
    DimensionMismatch {
        /// Human-readable description of the mismatch.
        message: String,
        /// Expected shape description.
        expected: String,
        /// Actual shape description.
        actual: String,
    },

    /// Operation not available for the element type.
    ///
    /// Typically a floating-point-only operation invoked on an integral dtype.
    #[error("Operation `{operation}` is not available for dtype {dtype:?}")]
    UnsupportedDType {
        /// Name of the operation that was attempted.
        operation: String,
        /// The dtype it was attempted on.
        dtype: DType,
    },

    /// A precondition on an argument does not hold.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The worker pool could not be built.
    #[error("Failed to build thread pool: {0}")]
    ThreadPoolBuild(String),
}

impl TensorError {
    /// Creates an `InvalidShape` error with clear context.
    pub fn invalid_shape(expected: usize, actual: usize) -> Self {
        Self::InvalidShape { expected, actual }
    }

    /// Creates an `IndexOutOfBounds` error with clear context.
    pub fn index_out_of_bounds(index: usize, size: usize) -> Self {
        Self::IndexOutOfBounds { index, size }
    }

    /// Creates an `AxisOutOfBounds` error with clear context.
    pub fn axis_out_of_bounds(axis: usize, rank: usize) -> Self {
        Self::AxisOutOfBounds { axis, rank }
    }

    /// Creates a `DimensionMismatch` error with formatted shapes.
    pub fn dimension_mismatch(
        message: impl Into<String>,
        expected: &[usize],
        actual: &[usize],
    ) -> Self {
        Self::DimensionMismatch {
            message: message.into(),
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        }
    }

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
