//! Strided layout: the mapping from N-dimensional indices to flat pointers.

use crate::error::TensorError;
use crate::order::Order;
use crate::shape::Shape;

const C_DENSE: u8 = 1;
const F_DENSE: u8 = 2;

/// Offset + per-axis strides + shape: the mapping
/// `pointer(idx) = offset + Σ idx[d] · strides[d]`.
///
/// A layout is a *view*: several layouts may alias one storage, and all view
/// transforms (permute, narrow, squeeze, expand, ...) only produce new
/// layouts. The row-major/column-major properties are derived from the
/// strides, not stored.
///
/// # Examples
///
/// ```
/// use ndarr_tensor::{Order, Shape, StrideLayout};
///
/// let l = StrideLayout::dense(Shape::of(&[2, 3]), Order::C);
/// assert_eq!(l.strides(), &[3, 1]);
/// assert_eq!(l.pointer(&[1, 2]), 5);
/// assert!(l.is_c_ordered());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrideLayout {
    shape: Shape,
    offset: usize,
    strides: Vec<usize>,
    flags: u8,
}

impl StrideLayout {
    /// Creates a layout from shape, offset and strides.
    ///
    /// # Errors
    ///
    /// Returns an error if the strides length differs from the shape rank.
    pub fn of(shape: Shape, offset: usize, strides: Vec<usize>) -> Result<StrideLayout, TensorError> {
        if shape.rank() != strides.len() {
            return Err(TensorError::invalid_argument(
                "Dimensions do not have the same length as strides.",
            ));
        }
        let mut layout = StrideLayout {
            shape,
            offset,
            strides,
            flags: 0,
        };
        layout.update_flags();
        Ok(layout)
    }

    /// Creates the dense (contiguous) layout of `shape` in the given order
    /// starting at offset 0.
    pub fn dense(shape: Shape, order: Order) -> StrideLayout {
        Self::dense_at(shape, 0, order)
    }

    /// Creates the dense layout of `shape` in the given order at `offset`.
    pub fn dense_at(shape: Shape, offset: usize, order: Order) -> StrideLayout {
        let rank = shape.rank();
        let mut strides = vec![0; rank];
        let mut stride = 1;
        match order.auto_fc() {
            Order::F => {
                for axis in 0..rank {
                    strides[axis] = stride;
                    stride *= shape.dim(axis);
                }
            }
            _ => {
                for axis in (0..rank).rev() {
                    strides[axis] = stride;
                    stride *= shape.dim(axis);
                }
            }
        }
        // strides length equals rank by construction
        Self::of(shape, offset, strides).expect("dense layout is always consistent")
    }

    /// Creates a rank-0 scalar layout at `offset`.
    pub fn scalar(offset: usize) -> StrideLayout {
        Self::of(Shape::scalar(), offset, Vec::new()).expect("scalar layout is always consistent")
    }

    fn update_flags(&mut self) {
        self.flags = 0;
        if self.rank() < 2 {
            self.flags |= C_DENSE | F_DENSE;
            return;
        }
        if self.is_valid_c_order() {
            self.flags |= C_DENSE;
        }
        if self.is_valid_f_order() {
            self.flags |= F_DENSE;
        }
    }

    fn is_valid_f_order(&self) -> bool {
        for i in 1..self.rank() {
            if self.strides[i] != self.strides[i - 1] * self.shape.dim(i - 1) {
                return false;
            }
        }
        true
    }

    fn is_valid_c_order(&self) -> bool {
        for i in (0..self.rank().saturating_sub(1)).rev() {
            if self.strides[i] != self.strides[i + 1] * self.shape.dim(i + 1) {
                return false;
            }
        }
        true
    }

    /// Returns the shape of the layout.
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the base offset into the storage.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns all per-axis strides.
    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Returns the stride of `axis`; rank-0 layouts report stride 1.
    #[inline]
    pub fn stride(&self, axis: usize) -> usize {
        if self.strides.is_empty() {
            return 1;
        }
        self.strides[axis]
    }

    /// Returns the size of dimension `axis`.
    #[inline]
    pub fn dim(&self, axis: usize) -> usize {
        self.shape.dim(axis)
    }

    /// Returns the number of dimensions.
    #[inline]
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Returns the number of addressable elements.
    #[inline]
    pub fn size(&self) -> usize {
        self.shape.size()
    }

    /// True if axes are ordered so that the rightmost varies fastest.
    #[inline]
    pub fn is_c_ordered(&self) -> bool {
        self.flags & C_DENSE == C_DENSE
    }

    /// True if axes are ordered so that the leftmost varies fastest.
    #[inline]
    pub fn is_f_ordered(&self) -> bool {
        self.flags & F_DENSE == F_DENSE
    }

    /// True if the layout walks a gapless contiguous region of storage.
    pub fn is_dense(&self) -> bool {
        let rank = self.rank();
        (self.is_c_ordered() && (rank == 0 || self.stride(rank - 1) == 1))
            || (self.is_f_ordered() && self.stride(0) == 1)
    }

    /// The concrete order in which the storage is traversed fastest.
    ///
    /// Returns [`Order::S`] for layouts that are neither C- nor F-ordered.
    pub fn storage_fast_order(&self) -> Order {
        // rank < 2 is dense either way; report the default
        if self.rank() < 2 {
            return Order::default_order();
        }
        if self.is_f_ordered() {
            return Order::F;
        }
        if self.is_c_ordered() {
            return Order::C;
        }
        Order::S
    }

    /// Computes the flat pointer of `index`.
    ///
    /// Bounds are not checked here; callers validate indices against the
    /// shape first.
    #[inline]
    pub fn pointer(&self, index: &[usize]) -> usize {
        debug_assert_eq!(index.len(), self.rank());
        let mut pointer = self.offset;
        for (&i, &s) in index.iter().zip(self.strides.iter()) {
            pointer += i * s;
        }
        pointer
    }

    /// Returns the strides with the given axis removed.
    pub fn narrow_strides(&self, axis: usize) -> Result<Vec<usize>, TensorError> {
        if axis >= self.rank() {
            return Err(TensorError::axis_out_of_bounds(axis, self.rank()));
        }
        let mut strides = self.strides.clone();
        strides.remove(axis);
        Ok(strides)
    }

    /// Canonicalizes the layout so that the fastest axis comes first.
    ///
    /// The requested traversal `order` selects how axes are arranged before
    /// canonicalization: `F` keeps them, `C` reverses them, `S` sorts them by
    /// ascending stride (zero strides last), anything else resolves to the
    /// default order. With `compact`, axes whose dim·stride chain is
    /// contiguous are merged, yielding the minimal set of loop axes.
    pub fn compute_fortran_layout(&self, order: Order, compact: bool) -> StrideLayout {
        let rank = self.rank();
        let (mut dims, mut strides): (Vec<usize>, Vec<usize>) = match order {
            Order::F => (self.shape.dims().to_vec(), self.strides.clone()),
            Order::S => {
                let mut axes: Vec<usize> = (0..rank).collect();
                axes.sort_by(|&i, &j| {
                    match (self.strides[i] == 0, self.strides[j] == 0) {
                        (true, true) => self.dim(i).cmp(&self.dim(j)),
                        (true, false) => std::cmp::Ordering::Greater,
                        (false, true) => std::cmp::Ordering::Less,
                        (false, false) => self.strides[i]
                            .cmp(&self.strides[j])
                            .then(self.dim(i).cmp(&self.dim(j))),
                    }
                });
                (
                    axes.iter().map(|&a| self.dim(a)).collect(),
                    axes.iter().map(|&a| self.strides[a]).collect(),
                )
            }
            // C and the auto orders walk the reversed axes
            _ => {
                let mut dims = self.shape.dims().to_vec();
                let mut strides = self.strides.clone();
                dims.reverse();
                strides.reverse();
                (dims, strides)
            }
        };
        if compact {
            let len = compact_fortran_layout(&mut dims, &mut strides);
            dims.truncate(len);
            strides.truncate(len);
        }
        StrideLayout::of(Shape::from(dims), self.offset, strides)
            .expect("canonicalized layout is always consistent")
    }

    /// Removes every dimension of size 1.
    pub fn squeeze(&self) -> StrideLayout {
        if self.shape.unit_dim_count() == 0 {
            return self.clone();
        }
        let mut dims = Vec::with_capacity(self.rank());
        let mut strides = Vec::with_capacity(self.rank());
        for axis in 0..self.rank() {
            if self.dim(axis) == 1 {
                continue;
            }
            dims.push(self.dim(axis));
            strides.push(self.strides[axis]);
        }
        StrideLayout::of(Shape::from(dims), self.offset, strides)
            .expect("squeezed layout is always consistent")
    }

    /// Removes the given axes where they have size 1; other axes are kept.
    ///
    /// # Errors
    ///
    /// Returns an error on out-of-bounds or duplicate axes.
    pub fn squeeze_axes(&self, axes: &[usize]) -> Result<StrideLayout, TensorError> {
        if axes.is_empty() {
            return Ok(self.clone());
        }
        validate_axes(axes, self.rank())?;
        let mut dims = Vec::with_capacity(self.rank());
        let mut strides = Vec::with_capacity(self.rank());
        for axis in 0..self.rank() {
            if axes.contains(&axis) && self.dim(axis) == 1 {
                continue;
            }
            dims.push(self.dim(axis));
            strides.push(self.strides[axis]);
        }
        StrideLayout::of(Shape::from(dims), self.offset, strides)
    }

    /// Inserts size-1 axes at the given positions of the resulting layout.
    ///
    /// # Errors
    ///
    /// Returns an error on out-of-bounds or duplicate axes.
    pub fn stretch(&self, axes: &[usize]) -> Result<StrideLayout, TensorError> {
        if axes.is_empty() {
            return Ok(self.clone());
        }
        let len = self.rank() + axes.len();
        for &axis in axes {
            if axis >= len {
                return Err(TensorError::axis_out_of_bounds(axis, len));
            }
        }
        if contains_duplicates(axes) {
            return Err(TensorError::invalid_argument("Axes contain duplicates."));
        }
        let mut dims = vec![1; len];
        let mut strides = vec![0; len];
        let mut src_axis = 0;
        for i in 0..len {
            if !axes.contains(&i) {
                dims[i] = self.dim(src_axis);
                strides[i] = self.strides[src_axis];
                src_axis += 1;
            }
        }
        StrideLayout::of(Shape::from(dims), self.offset, strides)
    }

    /// Broadcasts a size-1 axis to `size` by giving it stride 0.
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is out of bounds or not of size 1.
    pub fn expand(&self, axis: usize, size: usize) -> Result<StrideLayout, TensorError> {
        if axis >= self.rank() {
            return Err(TensorError::axis_out_of_bounds(axis, self.rank()));
        }
        if self.dim(axis) != 1 {
            return Err(TensorError::invalid_argument(format!(
                "Dimension {} must have size 1, but has size {}.",
                axis,
                self.dim(axis)
            )));
        }
        let mut dims = self.shape.dims().to_vec();
        let mut strides = self.strides.clone();
        dims[axis] = size;
        strides[axis] = 0;
        StrideLayout::of(Shape::from(dims), self.offset, strides)
    }

    /// Reverses the order of all axes (full transpose).
    pub fn revert(&self) -> StrideLayout {
        let mut dims = self.shape.dims().to_vec();
        let mut strides = self.strides.clone();
        dims.reverse();
        strides.reverse();
        StrideLayout::of(Shape::from(dims), self.offset, strides)
            .expect("reverted layout is always consistent")
    }

    /// Moves axis `src` to position `dst`, shifting the axes in between.
    ///
    /// # Errors
    ///
    /// Returns an error if either axis is out of bounds.
    pub fn move_axis(&self, src: usize, dst: usize) -> Result<StrideLayout, TensorError> {
        if src >= self.rank() {
            return Err(TensorError::axis_out_of_bounds(src, self.rank()));
        }
        if dst >= self.rank() {
            return Err(TensorError::axis_out_of_bounds(dst, self.rank()));
        }
        if src == dst {
            return Ok(self.clone());
        }
        let mut dims = self.shape.dims().to_vec();
        let mut strides = self.strides.clone();
        let dim = dims.remove(src);
        let stride = strides.remove(src);
        dims.insert(dst, dim);
        strides.insert(dst, stride);
        StrideLayout::of(Shape::from(dims), self.offset, strides)
    }

    /// Swaps axes `src` and `dst`.
    ///
    /// # Errors
    ///
    /// Returns an error if either axis is out of bounds.
    pub fn swap_axis(&self, src: usize, dst: usize) -> Result<StrideLayout, TensorError> {
        if src >= self.rank() {
            return Err(TensorError::axis_out_of_bounds(src, self.rank()));
        }
        if dst >= self.rank() {
            return Err(TensorError::axis_out_of_bounds(dst, self.rank()));
        }
        if src == dst {
            return Ok(self.clone());
        }
        let mut dims = self.shape.dims().to_vec();
        let mut strides = self.strides.clone();
        dims.swap(src, dst);
        strides.swap(src, dst);
        StrideLayout::of(Shape::from(dims), self.offset, strides)
    }

    /// Restricts `axis` to `[start, end)`, adjusting the offset.
    ///
    /// With `keepdim` false a resulting size-1 axis is squeezed away.
    ///
    /// # Errors
    ///
    /// Returns an error if the axis or range is invalid.
    pub fn narrow(
        &self,
        axis: usize,
        keepdim: bool,
        start: usize,
        end: usize,
    ) -> Result<StrideLayout, TensorError> {
        if axis >= self.rank() {
            return Err(TensorError::axis_out_of_bounds(axis, self.rank()));
        }
        if start > end || end > self.dim(axis) {
            return Err(TensorError::invalid_argument(format!(
                "Narrow range [{start},{end}) is invalid for dimension of size {}.",
                self.dim(axis)
            )));
        }
        if self.rank() == 1 {
            return StrideLayout::of(
                Shape::of(&[end - start]),
                self.offset + self.stride(axis) * start,
                self.strides.clone(),
            );
        }
        let mut dims = self.shape.dims().to_vec();
        dims[axis] = end - start;
        let offset = self.offset + start * self.stride(axis);
        let result = StrideLayout::of(Shape::from(dims), offset, self.strides.clone())?;
        if keepdim {
            Ok(result)
        } else {
            result.squeeze_axes(&[axis])
        }
    }

    /// Restricts every axis to its `[starts[i], ends[i])` range.
    ///
    /// # Errors
    ///
    /// Returns an error if the range arrays do not match the rank or any
    /// range is invalid.
    pub fn narrow_all(&self, starts: &[usize], ends: &[usize]) -> Result<StrideLayout, TensorError> {
        if starts.len() != self.rank() {
            return Err(TensorError::invalid_argument(
                "Start array must have length equal to the rank.",
            ));
        }
        if starts.len() != ends.len() {
            return Err(TensorError::invalid_argument(
                "Starts and ends do not have the same length.",
            ));
        }
        let mut dims = self.shape.dims().to_vec();
        let mut offset = self.offset;
        for axis in 0..dims.len() {
            if starts[axis] > ends[axis] || ends[axis] > self.dim(axis) {
                return Err(TensorError::invalid_argument(format!(
                    "Narrow range [{},{}) is invalid for dimension of size {}.",
                    starts[axis],
                    ends[axis],
                    self.dim(axis)
                )));
            }
            dims[axis] = ends[axis] - starts[axis];
            offset += starts[axis] * self.strides[axis];
        }
        StrideLayout::of(Shape::from(dims), offset, self.strides.clone())
    }

    /// Reorders the axes: output axis `i` is input axis `axes[i]`.
    ///
    /// # Errors
    ///
    /// Returns an error unless `axes` is a permutation of `0..rank`.
    pub fn permute(&self, axes: &[usize]) -> Result<StrideLayout, TensorError> {
        if axes.len() != self.rank() {
            return Err(TensorError::invalid_argument(
                "Number of dimensions is not equal to the rank.",
            ));
        }
        let mut seen = vec![false; self.rank()];
        for &axis in axes {
            if axis >= self.rank() {
                return Err(TensorError::axis_out_of_bounds(axis, self.rank()));
            }
            if seen[axis] {
                return Err(TensorError::invalid_argument(format!(
                    "Dimension values contain duplicates: {axes:?}"
                )));
            }
            seen[axis] = true;
        }
        let dims: Vec<usize> = axes.iter().map(|&a| self.dim(a)).collect();
        let strides: Vec<usize> = axes.iter().map(|&a| self.strides[a]).collect();
        StrideLayout::of(Shape::from(dims), self.offset, strides)
    }

    /// Attempts a zero-copy reshape to `shape` in the given concrete order.
    ///
    /// Succeeds only when the layout is verifiably the dense encoding of its
    /// current shape in that order, so the target's dense strides address
    /// exactly the same storage region. Anything more ambiguous returns
    /// `None` and callers fall back to a materializing copy.
    pub fn attempt_reshape(&self, shape: &Shape, order: Order) -> Option<StrideLayout> {
        if shape.size() != self.size() {
            return None;
        }
        let dense = match order {
            Order::C => self.is_c_ordered() && (self.rank() == 0 || self.stride(self.rank() - 1) == 1),
            Order::F => self.is_f_ordered() && self.stride(0) == 1,
            _ => false,
        };
        if !dense {
            return None;
        }
        Some(StrideLayout::dense_at(shape.clone(), self.offset, order))
    }

    /// The order walking both `self` and `other` with the best locality for
    /// `other` (the write side of tandem walks).
    pub fn storage_fast_tandem_order(&self, other: &StrideLayout) -> Order {
        match other.storage_fast_order() {
            Order::F => Order::F,
            Order::C => Order::C,
            _ => match self.storage_fast_order() {
                Order::F => Order::F,
                _ => Order::C,
            },
        }
    }
}

fn compact_fortran_layout(dims: &mut [usize], strides: &mut [usize]) -> usize {
    if dims.len() < 2 {
        return dims.len();
    }
    let mut len = 1;
    for i in 1..dims.len() {
        if dims[len - 1] * strides[len - 1] == strides[i] {
            dims[len - 1] *= dims[i];
            continue;
        }
        dims[len] = dims[i];
        strides[len] = strides[i];
        len += 1;
    }
    len
}

fn contains_duplicates(axes: &[usize]) -> bool {
    for i in 0..axes.len() {
        for j in i + 1..axes.len() {
            if axes[i] == axes[j] {
                return true;
            }
        }
    }
    false
}

fn validate_axes(axes: &[usize], rank: usize) -> Result<(), TensorError> {
    for &axis in axes {
        if axis >= rank {
            return Err(TensorError::axis_out_of_bounds(axis, rank));
        }
    }
    if contains_duplicates(axes) {
        return Err(TensorError::invalid_argument(
            "Duplicate values in axis parameters.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(dims: &[usize], offset: usize, strides: &[usize]) -> StrideLayout {
        StrideLayout::of(Shape::of(dims), offset, strides.to_vec()).unwrap()
    }

    #[test]
    fn dense_orders() {
        let c = StrideLayout::dense(Shape::of(&[2, 3, 4]), Order::C);
        assert_eq!(c.strides(), &[12, 4, 1]);
        assert!(c.is_c_ordered());
        assert!(c.is_dense());

        let f = StrideLayout::dense(Shape::of(&[2, 3, 4]), Order::F);
        assert_eq!(f.strides(), &[1, 2, 6]);
        assert!(f.is_f_ordered());
        assert!(f.is_dense());
    }

    #[test]
    fn pointer_arithmetic() {
        let l = layout(&[2, 3], 10, &[3, 1]);
        assert_eq!(l.pointer(&[0, 0]), 10);
        assert_eq!(l.pointer(&[1, 2]), 15);
    }

    #[test]
    fn permute_roundtrip() -> Result<(), TensorError> {
        let l = StrideLayout::dense(Shape::of(&[2, 3, 4]), Order::C);
        let p = l.permute(&[2, 0, 1])?;
        assert_eq!(p.shape().dims(), &[4, 2, 3]);
        assert_eq!(p.strides(), &[1, 12, 4]);
        let back = p.permute(&[1, 2, 0])?;
        assert_eq!(back, l);
        Ok(())
    }

    #[test]
    fn permute_rejects_duplicates() {
        let l = StrideLayout::dense(Shape::of(&[2, 3]), Order::C);
        assert!(l.permute(&[0, 0]).is_err());
        assert!(l.permute(&[0, 2]).is_err());
    }

    #[test]
    fn narrow_adjusts_offset() -> Result<(), TensorError> {
        let l = StrideLayout::dense(Shape::of(&[4, 5]), Order::C);
        let n = l.narrow(1, true, 2, 4)?;
        assert_eq!(n.shape().dims(), &[4, 2]);
        assert_eq!(n.offset(), 2);
        assert_eq!(n.strides(), &[5, 1]);
        let n = l.narrow(0, true, 1, 4)?;
        assert_eq!(n.offset(), 5);
        assert!(l.narrow(0, true, 3, 2).is_err());
        assert!(l.narrow(1, true, 0, 6).is_err());
        Ok(())
    }

    #[test]
    fn narrow_without_keepdim_squeezes() -> Result<(), TensorError> {
        let l = StrideLayout::dense(Shape::of(&[4, 5]), Order::C);
        let n = l.narrow(0, false, 2, 3)?;
        assert_eq!(n.shape().dims(), &[5]);
        assert_eq!(n.offset(), 10);
        Ok(())
    }

    #[test]
    fn squeeze_and_stretch() -> Result<(), TensorError> {
        let l = StrideLayout::dense(Shape::of(&[1, 3, 1, 2]), Order::C);
        let s = l.squeeze();
        assert_eq!(s.shape().dims(), &[3, 2]);
        let st = s.stretch(&[0])?;
        assert_eq!(st.shape().dims(), &[1, 3, 2]);
        assert_eq!(st.stride(0), 0);
        Ok(())
    }

    #[test]
    fn expand_gives_zero_stride() -> Result<(), TensorError> {
        let l = StrideLayout::dense(Shape::of(&[3, 1]), Order::C);
        let e = l.expand(1, 4)?;
        assert_eq!(e.shape().dims(), &[3, 4]);
        assert_eq!(e.strides(), &[1, 0]);
        assert!(l.expand(0, 4).is_err());
        Ok(())
    }

    #[test]
    fn move_and_swap_axis() -> Result<(), TensorError> {
        let l = StrideLayout::dense(Shape::of(&[2, 3, 4]), Order::C);
        let m = l.move_axis(0, 2)?;
        assert_eq!(m.shape().dims(), &[3, 4, 2]);
        let m = l.move_axis(2, 0)?;
        assert_eq!(m.shape().dims(), &[4, 2, 3]);
        let s = l.swap_axis(0, 2)?;
        assert_eq!(s.shape().dims(), &[4, 3, 2]);
        assert_eq!(s.strides(), &[1, 4, 12]);
        Ok(())
    }

    #[test]
    fn fortran_canonicalization_compacts_dense() {
        let l = StrideLayout::dense(Shape::of(&[2, 3, 4]), Order::C);
        let compact = l.compute_fortran_layout(Order::C, true);
        assert_eq!(compact.shape().dims(), &[24]);
        assert_eq!(compact.strides(), &[1]);

        // a permuted layout cannot merge all axes
        let p = l.permute(&[1, 0, 2]).unwrap();
        let compact = p.compute_fortran_layout(Order::C, true);
        assert!(compact.rank() > 1);
    }

    #[test]
    fn storage_fast_order_detection() {
        let c = StrideLayout::dense(Shape::of(&[2, 3]), Order::C);
        assert_eq!(c.storage_fast_order(), Order::C);
        let f = StrideLayout::dense(Shape::of(&[2, 3]), Order::F);
        assert_eq!(f.storage_fast_order(), Order::F);
        let s = layout(&[2, 3], 0, &[1, 4]);
        assert_eq!(s.storage_fast_order(), Order::S);
    }

    #[test]
    fn attempt_reshape_dense_only() {
        let l = StrideLayout::dense(Shape::of(&[2, 6]), Order::C);
        let r = l.attempt_reshape(&Shape::of(&[3, 4]), Order::C).unwrap();
        assert_eq!(r.shape().dims(), &[3, 4]);
        assert_eq!(r.strides(), &[4, 1]);

        // narrowed layout is not dense, must copy
        let n = l.narrow(1, true, 0, 3).unwrap();
        assert!(n.attempt_reshape(&Shape::of(&[3, 3]), Order::C).is_none());

        // order mismatch must copy
        assert!(l.attempt_reshape(&Shape::of(&[3, 4]), Order::F).is_none());
    }
}
