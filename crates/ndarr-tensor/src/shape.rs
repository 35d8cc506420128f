use crate::error::TensorError;
use crate::order::Order;

/// An immutable ordered sequence of dimension sizes.
///
/// A shape of rank 0 denotes a scalar; its size is 1. Dimension sizes may be
/// zero, in which case the shape is empty (`size() == 0`).
///
/// # Examples
///
/// ```
/// use ndarr_tensor::Shape;
///
/// let s = Shape::of(&[2, 3, 4]);
/// assert_eq!(s.rank(), 3);
/// assert_eq!(s.size(), 24);
/// assert_eq!(s.dim(1), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a shape from a slice of dimension sizes.
    pub fn of(dims: &[usize]) -> Shape {
        Shape {
            dims: dims.to_vec(),
        }
    }

    /// Creates a scalar (rank 0) shape.
    pub fn scalar() -> Shape {
        Shape { dims: Vec::new() }
    }

    /// Returns the number of dimensions.
    #[inline]
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements, the product of all dimensions.
    #[inline]
    pub fn size(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the size of dimension `axis`.
    ///
    /// # Panics
    ///
    /// Panics if `axis >= rank()`.
    #[inline]
    pub fn dim(&self, axis: usize) -> usize {
        self.dims[axis]
    }

    /// Returns all dimension sizes.
    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the number of dimensions of size 1.
    pub fn unit_dim_count(&self) -> usize {
        self.dims.iter().filter(|&&d| d == 1).count()
    }

    /// Returns the dimension sizes with the given axis removed.
    ///
    /// # Errors
    ///
    /// Returns an error if `axis` is out of bounds.
    pub fn narrow_dims(&self, axis: usize) -> Result<Vec<usize>, TensorError> {
        if axis >= self.rank() {
            return Err(TensorError::axis_out_of_bounds(axis, self.rank()));
        }
        let mut dims = self.dims.clone();
        dims.remove(axis);
        Ok(dims)
    }

    /// Converts a flat position in the given traversal order into an index.
    ///
    /// # Errors
    ///
    /// Returns an error if `position >= size()` or the order is not concrete.
    pub fn index(&self, order: Order, position: usize) -> Result<Vec<usize>, TensorError> {
        if position >= self.size() {
            return Err(TensorError::index_out_of_bounds(position, self.size()));
        }
        let mut index = vec![0; self.rank()];
        let mut rem = position;
        match order {
            Order::C => {
                for axis in (0..self.rank()).rev() {
                    index[axis] = rem % self.dims[axis];
                    rem /= self.dims[axis];
                }
            }
            Order::F => {
                for axis in 0..self.rank() {
                    index[axis] = rem % self.dims[axis];
                    rem /= self.dims[axis];
                }
            }
            order => {
                return Err(TensorError::invalid_argument(format!(
                    "Order {order:?} is not concrete, use C or F."
                )));
            }
        }
        Ok(index)
    }

    /// Converts an index into a flat position in the given traversal order.
    ///
    /// # Errors
    ///
    /// Returns an error if the index rank or any coordinate is out of bounds,
    /// or the order is not concrete.
    pub fn position(&self, order: Order, index: &[usize]) -> Result<usize, TensorError> {
        if index.len() != self.rank() {
            return Err(TensorError::dimension_mismatch(
                "Index rank must match shape rank",
                &self.dims,
                index,
            ));
        }
        for (axis, (&i, &d)) in index.iter().zip(self.dims.iter()).enumerate() {
            if i >= d {
                return Err(TensorError::index_out_of_bounds(index[axis], d));
            }
        }
        let mut position = 0;
        match order {
            Order::C => {
                for (&i, &d) in index.iter().zip(self.dims.iter()) {
                    position = position * d + i;
                }
            }
            Order::F => {
                for (&i, &d) in index.iter().zip(self.dims.iter()).rev() {
                    position = position * d + i;
                }
            }
            order => {
                return Err(TensorError::invalid_argument(format!(
                    "Order {order:?} is not concrete, use C or F."
                )));
            }
        }
        Ok(position)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Shape {
        Shape { dims }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_shape() {
        let s = Shape::scalar();
        assert_eq!(s.rank(), 0);
        assert_eq!(s.size(), 1);
    }

    #[test]
    fn size_and_rank() {
        let s = Shape::of(&[2, 3, 4]);
        assert_eq!(s.rank(), 3);
        assert_eq!(s.size(), 24);
        assert_eq!(s.unit_dim_count(), 0);
        assert_eq!(Shape::of(&[1, 3, 1]).unit_dim_count(), 2);
    }

    #[test]
    fn index_position_roundtrip() -> Result<(), TensorError> {
        let s = Shape::of(&[2, 3]);
        for pos in 0..s.size() {
            let idx = s.index(Order::C, pos)?;
            assert_eq!(s.position(Order::C, &idx)?, pos);
            let idx = s.index(Order::F, pos)?;
            assert_eq!(s.position(Order::F, &idx)?, pos);
        }
        Ok(())
    }

    #[test]
    fn index_order_semantics() -> Result<(), TensorError> {
        let s = Shape::of(&[2, 3]);
        assert_eq!(s.index(Order::C, 1)?, vec![0, 1]);
        assert_eq!(s.index(Order::F, 1)?, vec![1, 0]);
        Ok(())
    }

    #[test]
    fn position_out_of_bounds() {
        let s = Shape::of(&[2, 3]);
        assert!(s.position(Order::C, &[2, 0]).is_err());
        assert!(s.index(Order::C, 6).is_err());
    }
}
