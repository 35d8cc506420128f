//! The tensor: a strided layout over shared storage plus an engine handle.

use crate::dtype::{DType, Element};
use crate::engine::Engine;
use crate::error::TensorError;
use crate::layout::StrideLayout;
use crate::loops::{LoopDescriptor, PointerIterator};
use crate::order::Order;
use crate::shape::Shape;
use crate::storage::Storage;

/// A dense N-dimensional array over strided, shareable storage.
///
/// A tensor combines three parts: the [`Storage`] (flat buffer, possibly
/// shared), the [`StrideLayout`] (index-to-pointer mapping) and an
/// [`Engine`] handle for allocating results and dispatching parallel work.
///
/// Shape transforms (`permute`, `narrow`, `squeeze`, `expand`, ...) return
/// *views*: new tensors aliasing the same storage under a different layout.
/// Mutating an element through a view is visible through every other view of
/// the same storage. `Clone` is a view too; use [`Tensor::copy`] for a deep
/// copy.
///
/// # Examples
///
/// ```
/// use ndarr_tensor::{Engine, Order, Shape};
///
/// let engine = Engine::new().unwrap();
/// let t = engine.seq::<f64>(Shape::of(&[2, 3]), Order::C);
/// let tt = t.t();
/// assert_eq!(tt.shape().dims(), &[3, 2]);
/// assert_eq!(tt.get(&[2, 1]).unwrap(), t.get(&[1, 2]).unwrap());
/// ```
pub struct Tensor<T: Element> {
    engine: Engine,
    layout: StrideLayout,
    storage: Storage<T>,
}

impl<T: Element> Tensor<T> {
    pub(crate) fn from_parts(engine: Engine, layout: StrideLayout, storage: Storage<T>) -> Tensor<T> {
        Tensor {
            engine,
            layout,
            storage,
        }
    }

    /// Returns the engine this tensor computes on.
    #[inline]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Returns the layout mapping indices to storage pointers.
    #[inline]
    pub fn layout(&self) -> &StrideLayout {
        &self.layout
    }

    /// Returns the underlying storage.
    #[inline]
    pub fn storage(&self) -> &Storage<T> {
        &self.storage
    }

    /// Returns the shape.
    #[inline]
    pub fn shape(&self) -> &Shape {
        self.layout.shape()
    }

    /// Returns the number of dimensions.
    #[inline]
    pub fn rank(&self) -> usize {
        self.layout.rank()
    }

    /// Returns the number of elements.
    #[inline]
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    /// Returns the size of dimension `axis`.
    #[inline]
    pub fn dim(&self, axis: usize) -> usize {
        self.layout.dim(axis)
    }

    /// Returns the runtime dtype tag.
    #[inline]
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// True for rank-0 tensors.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.rank() == 0
    }

    /// True for rank-1 tensors.
    #[inline]
    pub fn is_vector(&self) -> bool {
        self.rank() == 1
    }

    /// True for rank-2 tensors.
    #[inline]
    pub fn is_matrix(&self) -> bool {
        self.rank() == 2
    }

    fn validate_index(&self, index: &[usize]) -> Result<(), TensorError> {
        if index.len() != self.rank() {
            return Err(TensorError::dimension_mismatch(
                "Index rank must match tensor rank",
                self.shape().dims(),
                index,
            ));
        }
        for (axis, &i) in index.iter().enumerate() {
            if i >= self.dim(axis) {
                return Err(TensorError::index_out_of_bounds(i, self.dim(axis)));
            }
        }
        Ok(())
    }

    /// Reads the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index rank or any coordinate is out of
    /// bounds.
    pub fn get(&self, index: &[usize]) -> Result<T, TensorError> {
        self.validate_index(index)?;
        Ok(self.storage.get(self.layout.pointer(index)))
    }

    /// Writes `value` at `index`.
    ///
    /// Visible through every view aliasing this storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of bounds.
    pub fn set(&mut self, index: &[usize], value: T) -> Result<(), TensorError> {
        self.validate_index(index)?;
        self.storage.set(self.layout.pointer(index), value);
        Ok(())
    }

    /// Adds `value` to the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns an error if the index is out of bounds.
    pub fn inc(&mut self, index: &[usize], value: T) -> Result<(), TensorError> {
        self.validate_index(index)?;
        self.storage.inc(self.layout.pointer(index), value);
        Ok(())
    }

    /// Reads the element at flat storage pointer `ptr`.
    #[inline]
    pub fn ptr_get(&self, ptr: usize) -> T {
        self.storage.get(ptr)
    }

    /// Writes `value` at flat storage pointer `ptr`.
    #[inline]
    pub fn ptr_set(&mut self, ptr: usize, value: T) {
        self.storage.set(ptr, value);
    }

    /// Extracts the single element of a size-1 tensor.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor holds more than one element.
    pub fn item(&self) -> Result<T, TensorError> {
        if self.size() != 1 {
            return Err(TensorError::invalid_argument(format!(
                "Tensor with shape {} holds {} elements, expected exactly 1.",
                self.shape(),
                self.size()
            )));
        }
        Ok(self.storage.get(self.layout.offset()))
    }

    /// Iterates the storage pointers of this tensor in `order`.
    pub fn ptr_iter(&self, order: Order) -> PointerIterator {
        PointerIterator::new(&self.layout, order)
    }

    /// Builds the execution plan for traversing this tensor in `order`.
    pub fn loop_descriptor(&self, order: Order) -> LoopDescriptor {
        LoopDescriptor::of(&self.layout, order, T::LANES)
    }

    fn view(&self, layout: StrideLayout) -> Tensor<T> {
        Tensor::from_parts(self.engine.clone(), layout, self.storage.clone())
    }

    // ---- view transforms -------------------------------------------------

    /// Full transpose: a view with all axes reversed.
    pub fn t(&self) -> Tensor<T> {
        self.view(self.layout.revert())
    }

    /// A view with axes reordered so output axis `i` is input axis
    /// `axes[i]`.
    ///
    /// # Errors
    ///
    /// Returns an error unless `axes` is a permutation of `0..rank`.
    pub fn permute(&self, axes: &[usize]) -> Result<Tensor<T>, TensorError> {
        Ok(self.view(self.layout.permute(axes)?))
    }

    /// A view with every size-1 axis removed.
    pub fn squeeze(&self) -> Tensor<T> {
        self.view(self.layout.squeeze())
    }

    /// A view with the given size-1 axes removed.
    ///
    /// # Errors
    ///
    /// Returns an error on out-of-bounds or duplicate axes.
    pub fn squeeze_axes(&self, axes: &[usize]) -> Result<Tensor<T>, TensorError> {
        Ok(self.view(self.layout.squeeze_axes(axes)?))
    }

    /// A view with size-1 axes inserted at the given output positions.
    ///
    /// # Errors
    ///
    /// Returns an error on out-of-bounds or duplicate axes.
    pub fn stretch(&self, axes: &[usize]) -> Result<Tensor<T>, TensorError> {
        Ok(self.view(self.layout.stretch(axes)?))
    }

    /// A broadcast view of a size-1 axis repeated `size` times via stride 0.
    ///
    /// No data is duplicated; all repeats alias the same elements.
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is out of bounds or not of size 1.
    pub fn expand(&self, axis: usize, size: usize) -> Result<Tensor<T>, TensorError> {
        Ok(self.view(self.layout.expand(axis, size)?))
    }

    /// Inserts a size-1 axis at `axis` and broadcasts it to `size`.
    ///
    /// # Errors
    ///
    /// Returns an error if the axis position is invalid.
    pub fn strexp(&self, axis: usize, size: usize) -> Result<Tensor<T>, TensorError> {
        self.stretch(&[axis])?.expand(axis, size)
    }

    /// A view with axis `src` moved to position `dst`.
    ///
    /// # Errors
    ///
    /// Returns an error if either axis is out of bounds.
    pub fn move_axis(&self, src: usize, dst: usize) -> Result<Tensor<T>, TensorError> {
        Ok(self.view(self.layout.move_axis(src, dst)?))
    }

    /// A view with axes `src` and `dst` swapped.
    ///
    /// # Errors
    ///
    /// Returns an error if either axis is out of bounds.
    pub fn swap_axis(&self, src: usize, dst: usize) -> Result<Tensor<T>, TensorError> {
        Ok(self.view(self.layout.swap_axis(src, dst)?))
    }

    /// A view of `axis` restricted to `[start, end)`.
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
    ) -> Result<Tensor<T>, TensorError> {
        Ok(self.view(self.layout.narrow(axis, keepdim, start, end)?))
    }

    /// A view with every axis restricted to `[starts[i], ends[i])`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ranges are inconsistent with the shape.
    pub fn narrow_all(&self, starts: &[usize], ends: &[usize]) -> Result<Tensor<T>, TensorError> {
        Ok(self.view(self.layout.narrow_all(starts, ends)?))
    }

    /// A view selecting one index of `axis`, with the axis squeezed away.
    ///
    /// # Errors
    ///
    /// Returns an error if the axis or index is out of bounds.
    pub fn select(&self, axis: usize, index: usize) -> Result<Tensor<T>, TensorError> {
        self.narrow(axis, false, index, index + 1)
    }

    /// Splits `axis` into the views starting at each of `indexes`.
    ///
    /// Each view spans from its index to the next one (the last spans to the
    /// end of the axis).
    ///
    /// # Errors
    ///
    /// Returns an error if the axis or any index range is invalid.
    pub fn split(
        &self,
        axis: usize,
        keepdim: bool,
        indexes: &[usize],
    ) -> Result<Vec<Tensor<T>>, TensorError> {
        let mut result = Vec::with_capacity(indexes.len());
        for (i, &start) in indexes.iter().enumerate() {
            let end = if i < indexes.len() - 1 {
                indexes[i + 1]
            } else {
                self.dim(axis)
            };
            result.push(self.narrow(axis, keepdim, start, end)?);
        }
        Ok(result)
    }

    /// Splits every axis at the given boundaries, producing the full grid of
    /// sub-views in row-major tile order.
    ///
    /// # Errors
    ///
    /// Returns an error if the boundary arrays do not match the rank or any
    /// range is invalid.
    pub fn split_all(&self, indexes: &[Vec<usize>]) -> Result<Vec<Tensor<T>>, TensorError> {
        if indexes.len() != self.rank() {
            return Err(TensorError::invalid_argument(format!(
                "Indexes length {} is not the same as shape rank {}.",
                indexes.len(),
                self.rank()
            )));
        }
        let mut results = Vec::new();
        let mut starts = vec![0; self.rank()];
        let mut ends = vec![0; self.rank()];
        self.split_all_rec(indexes, &mut starts, &mut ends, 0, &mut results)?;
        Ok(results)
    }

    fn split_all_rec(
        &self,
        indexes: &[Vec<usize>],
        starts: &mut Vec<usize>,
        ends: &mut Vec<usize>,
        level: usize,
        results: &mut Vec<Tensor<T>>,
    ) -> Result<(), TensorError> {
        for (i, &start) in indexes[level].iter().enumerate() {
            starts[level] = start;
            ends[level] = if i < indexes[level].len() - 1 {
                indexes[level][i + 1]
            } else {
                self.dim(level)
            };
            if level == indexes.len() - 1 {
                results.push(self.narrow_all(starts, ends)?);
            } else {
                self.split_all_rec(indexes, starts, ends, level + 1, results)?;
            }
        }
        Ok(())
    }

    /// Returns all slices along `axis` (one view per index).
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is out of bounds.
    pub fn unbind(&self, axis: usize, keepdim: bool) -> Result<Vec<Tensor<T>>, TensorError> {
        if axis >= self.rank() {
            return Err(TensorError::axis_out_of_bounds(axis, self.rank()));
        }
        let mut result = Vec::with_capacity(self.dim(axis));
        for i in 0..self.dim(axis) {
            result.push(self.narrow(axis, keepdim, i, i + 1)?);
        }
        Ok(result)
    }

    /// Fancy indexing along `axis`.
    ///
    /// Recognizes, in order: a single index (offset-adjusted view), a
    /// constant-step index run — step 0 selects a repeat — (strided view),
    /// and otherwise materializes by concatenating single-index slices.
    ///
    /// # Errors
    ///
    /// Returns an error if the axis or any index is out of bounds, or if
    /// `indices` is empty.
    pub fn take(&self, axis: usize, indices: &[usize]) -> Result<Tensor<T>, TensorError> {
        if axis >= self.rank() {
            return Err(TensorError::axis_out_of_bounds(axis, self.rank()));
        }
        if indices.is_empty() {
            return Err(TensorError::invalid_argument("Indices cannot be empty."));
        }
        for &index in indices {
            if index >= self.dim(axis) {
                return Err(TensorError::index_out_of_bounds(index, self.dim(axis)));
            }
        }

        // a single element: a view with an adjusted offset
        if indices.len() == 1 {
            return self.narrow(axis, true, indices[0], indices[0] + 1);
        }

        // a constant-step run of indices, step 0 meaning repeats
        if indices[1] >= indices[0] {
            let step = indices[1] - indices[0];
            let constant = indices
                .windows(2)
                .all(|w| w[1] >= w[0] && w[1] - w[0] == step);
            if constant {
                let mut dims = self.shape().dims().to_vec();
                let mut strides = self.layout.strides().to_vec();
                dims[axis] = indices.len();
                strides[axis] = self.layout.stride(axis) * step;
                let offset = self.layout.offset() + indices[0] * self.layout.stride(axis);
                let layout = StrideLayout::of(Shape::from(dims), offset, strides)?;
                return Ok(self.view(layout));
            }
        }

        // otherwise materialize by concatenating single-index slices
        let mut dims = self.shape().dims().to_vec();
        dims[axis] = indices.len();
        let result = self
            .engine
            .zeros::<T>(Shape::from(dims), Order::default_order());
        for (slot, &index) in indices.iter().enumerate() {
            let src = self.narrow(axis, true, index, index + 1)?;
            let mut dst = result.narrow(axis, true, slot, slot + 1)?;
            src.copy_to(&mut dst)?;
        }
        Ok(result)
    }

    /// The main diagonal (or the `k`-th one) of a matrix as an aliasing
    /// view; for a vector, a fresh matrix with the vector on diagonal `k`.
    ///
    /// # Errors
    ///
    /// Returns an error for ranks other than 1 or 2, or when the requested
    /// diagonal is empty.
    pub fn diag(&self, k: isize) -> Result<Tensor<T>, TensorError> {
        if self.is_vector() {
            let n = self.dim(0) + k.unsigned_abs();
            let row0 = k.min(0).unsigned_abs();
            let col0 = k.max(0) as usize;
            let mut m = self
                .engine
                .zeros::<T>(Shape::of(&[n, n]), Order::default_order());
            for i in 0..self.dim(0) {
                m.set(&[i + row0, i + col0], self.get(&[i])?)?;
            }
            return Ok(m);
        }
        if self.is_matrix() {
            let (rows, cols) = (self.dim(0), self.dim(1));
            let (row0, col0) = (k.min(0).unsigned_abs(), k.max(0) as usize);
            if row0 >= rows || col0 >= cols {
                return Err(TensorError::invalid_argument(format!(
                    "Diagonal {k} does not exist for shape {}.",
                    self.shape()
                )));
            }
            let len = (rows - row0).min(cols - col0);
            let offset =
                self.layout.offset() + row0 * self.layout.stride(0) + col0 * self.layout.stride(1);
            let stride = self.layout.stride(0) + self.layout.stride(1);
            let layout = StrideLayout::of(Shape::of(&[len]), offset, vec![stride])?;
            return Ok(self.view(layout));
        }
        Err(TensorError::invalid_argument(format!(
            "Diagonal is only available for vectors and matrices, shape is {}.",
            self.shape()
        )))
    }

    // ---- reshape / materialization ---------------------------------------

    /// Reshapes to `shape`, as a zero-copy view when the layout allows it
    /// and as a materialized copy otherwise.
    ///
    /// `Order::A` preserves the current ordering; `Order::S` is rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the sizes differ or the order is invalid.
    pub fn reshape(&self, shape: Shape, order: Order) -> Result<Tensor<T>, TensorError> {
        if self.size() != shape.size() {
            return Err(TensorError::dimension_mismatch(
                "Reshape requires the same number of elements",
                shape.dims(),
                self.shape().dims(),
            ));
        }
        let ask_order = match order {
            Order::A => {
                if self.layout.is_c_ordered() {
                    Order::C
                } else if self.layout.is_f_ordered() {
                    Order::F
                } else {
                    Order::default_order()
                }
            }
            Order::S => {
                return Err(TensorError::invalid_argument(
                    "Illegal order specification, use C, F or A.",
                ));
            }
            concrete => concrete,
        };

        if let Some(layout) = self.layout.attempt_reshape(&shape, ask_order) {
            return Ok(self.view(layout));
        }

        // fall back to an index-order pointer walk into fresh storage
        let copy = self.engine.zeros::<T>(shape, ask_order);
        let src = self.ptr_iter(ask_order);
        let dst = copy.ptr_iter(ask_order);
        for (sp, dp) in src.zip(dst) {
            copy.storage.set(dp, self.storage.get(sp));
        }
        Ok(copy)
    }

    /// A rank-1 tensor over the same elements in `order`; a view when the
    /// canonicalized layout is a single run, a copy otherwise.
    pub fn ravel(&self, order: Order) -> Tensor<T> {
        let compact = self.layout.compute_fortran_layout(order.auto_fc(), true);
        if compact.rank() == 1 {
            return self.view(compact);
        }
        self.flatten(order)
    }

    /// A fresh rank-1 tensor holding the elements traversed in `order`.
    pub fn flatten(&self, order: Order) -> Tensor<T> {
        let order = order.auto_fc();
        let result = self
            .engine
            .zeros::<T>(Shape::of(&[self.size()]), Order::default_order());
        let plan = self.loop_descriptor(order);
        let mut pos = 0;
        for &offset in &plan.offsets {
            let mut p = offset;
            for _ in 0..plan.bound {
                result.storage.set(pos, self.storage.get(p));
                pos += 1;
                p += plan.step;
            }
        }
        result
    }

    /// Casts every element to the element type `U`.
    pub fn cast<U: Element>(&self, order: Order) -> Tensor<U> {
        let order = order.auto_fc();
        let result = self.engine.zeros::<U>(self.shape().clone(), order);
        let src = self.ptr_iter(order);
        let dst = result.ptr_iter(order);
        for (sp, dp) in src.zip(dst) {
            result.storage.set(dp, U::from_f64(self.storage.get(sp).to_f64()));
        }
        result
    }

    /// Collects the elements traversed in `order` into a vector.
    pub fn to_vec(&self, order: Order) -> Vec<T> {
        let order = order.auto_fc();
        self.ptr_iter(order).map(|p| self.storage.get(p)).collect()
    }

    // ---- bulk copy -------------------------------------------------------

    /// Materializes a dense copy laid out in `order`.
    pub fn copy(&self, order: Order) -> Tensor<T> {
        let ask_order = order.auto_fc();
        let mut dst = self.engine.zeros::<T>(self.shape().clone(), ask_order);
        if self.layout.storage_fast_order() == ask_order {
            // fast path: one sequential pass in the shared fast order
            let plan = self.loop_descriptor(ask_order);
            let mut pos = 0;
            for &offset in &plan.offsets {
                let mut p = offset;
                for _ in 0..plan.bound {
                    dst.storage.set(pos, self.storage.get(p));
                    pos += 1;
                    p += plan.step;
                }
            }
        } else {
            self.copy_to(&mut dst)
                .expect("shapes match by construction");
        }
        dst
    }

    /// Copies every element into `dst`, tiling the work across the engine
    /// pool when the tensor exceeds the cache-derived limit.
    ///
    /// Tiles are built by recursively halving the currently-largest
    /// dimension until each tile fits the limit; the tile grid is enumerated
    /// iteratively with an explicit stack and one worker task is submitted
    /// per tile. Tiles are disjoint and cover the full index space, so each
    /// element is copied exactly once. The call blocks until every submitted
    /// task completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes differ.
    pub fn copy_to(&self, dst: &mut Tensor<T>) -> Result<(), TensorError> {
        if self.shape() != dst.shape() {
            return Err(TensorError::dimension_mismatch(
                "Copy requires identical shapes",
                self.shape().dims(),
                dst.shape().dims(),
            ));
        }
        let ask_order = self.layout.storage_fast_tandem_order(&dst.layout);
        let limit = self.engine.copy_limit::<T>();

        if self.size() <= limit {
            direct_copy(self, dst, ask_order);
            return Ok(());
        }

        let dims = self.shape().dims();
        let mut slices = dims.to_vec();
        let mut size: usize = slices.iter().product();
        while size > limit {
            let axis = argmax(&slices);
            if slices[axis] <= 1 {
                break;
            }
            size = size * (slices[axis] / 2) / slices[axis];
            slices[axis] /= 2;
        }
        let lens: Vec<usize> = dims
            .iter()
            .zip(slices.iter())
            .map(|(&d, &s)| d.div_ceil(s))
            .collect();
        log::debug!(
            "tiled copy: {} elems, limit {limit}, grid {lens:?}",
            self.size()
        );

        // enumerate the tile grid iteratively with an explicit stack
        let rank = dims.len();
        let mut tiles: Vec<(Vec<usize>, Vec<usize>)> = Vec::new();
        let mut starts = vec![0usize; rank];
        let mut ends = vec![0usize; rank];
        let mut stack: Vec<usize> = Vec::new();
        let mut active = true;
        while active || !stack.is_empty() {
            if active {
                let level = stack.len();
                if level == rank {
                    tiles.push((starts.clone(), ends.clone()));
                    active = false;
                } else {
                    stack.push(0);
                    starts[level] = 0;
                    ends[level] = slices[level].min(dims[level]);
                }
            } else {
                let last = stack.pop().expect("stack is non-empty in this branch");
                let level = stack.len();
                if last + 1 < lens[level] {
                    let last = last + 1;
                    stack.push(last);
                    starts[level] = last * slices[level];
                    ends[level] = ((last + 1) * slices[level]).min(dims[level]);
                    active = true;
                }
            }
        }

        let dst_view: &Tensor<T> = dst;
        self.engine.pool().scope(|scope| {
            for (ts, te) in &tiles {
                let src_tile = self
                    .narrow_all(ts, te)
                    .expect("tile bounds are within the shape");
                let dst_tile = dst_view
                    .narrow_all(ts, te)
                    .expect("tile bounds are within the shape");
                scope.spawn(move |_| {
                    direct_copy(&src_tile, &dst_tile, ask_order);
                });
            }
        });
        Ok(())
    }
}

fn argmax(values: &[usize]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Direct, unblocked copy between equally shaped tensors in `order`.
fn direct_copy<T: Element>(src: &Tensor<T>, dst: &Tensor<T>, order: Order) {
    let plan = LoopDescriptor::of(src.layout(), order, 1);
    let mut it = dst.ptr_iter(order);
    for &offset in &plan.offsets {
        let mut p = offset;
        for _ in 0..plan.bound {
            let q = it.next().expect("destination has the same element count");
            dst.storage.set(q, src.storage.get(p));
            p += plan.step;
        }
    }
}

impl<T: Element> Clone for Tensor<T> {
    /// Creates a view sharing the same storage; use [`Tensor::copy`] for a
    /// deep copy.
    fn clone(&self) -> Tensor<T> {
        Tensor {
            engine: self.engine.clone(),
            layout: self.layout.clone(),
            storage: self.storage.clone(),
        }
    }
}

impl<T: Element> std::fmt::Debug for Tensor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("dtype", &T::DTYPE)
            .field("shape", &self.shape().dims())
            .field("offset", &self.layout.offset())
            .field("strides", &self.layout.strides())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;

    fn engine() -> Engine {
        Engine::new().unwrap()
    }

    #[test]
    fn get_set_inc() -> Result<(), TensorError> {
        let engine = engine();
        let mut t = engine.zeros::<f64>(Shape::of(&[2, 2]), Order::C);
        t.set(&[0, 1], 3.0)?;
        t.inc(&[0, 1], 2.0)?;
        assert_eq!(t.get(&[0, 1])?, 5.0);
        assert!(t.get(&[2, 0]).is_err());
        assert!(t.get(&[0]).is_err());
        Ok(())
    }

    #[test]
    fn views_alias_storage() -> Result<(), TensorError> {
        let engine = engine();
        let t = engine.seq::<i32>(Shape::of(&[2, 3]), Order::C);
        let mut row = t.select(0, 1)?;
        row.set(&[2], 99)?;
        assert_eq!(t.get(&[1, 2])?, 99);
        Ok(())
    }

    #[test]
    fn narrow_then_widen_preserves_mapping() -> Result<(), TensorError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[4, 4]), Order::C);
        let n = t.narrow(0, true, 1, 3)?;
        for i in 0..2 {
            for j in 0..4 {
                assert_eq!(n.get(&[i, j])?, t.get(&[i + 1, j])?);
            }
        }
        Ok(())
    }

    #[test]
    fn permute_inverse_restores_mapping() -> Result<(), TensorError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[2, 3, 4]), Order::C);
        let p = t.permute(&[2, 0, 1])?;
        let back = p.permute(&[1, 2, 0])?;
        for i in 0..2 {
            for j in 0..3 {
                for k in 0..4 {
                    assert_eq!(back.get(&[i, j, k])?, t.get(&[i, j, k])?);
                }
            }
        }
        Ok(())
    }

    #[test]
    fn squeeze_stretch_roundtrip() -> Result<(), TensorError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[3, 4]), Order::C);
        let stretched = t.stretch(&[1])?;
        assert_eq!(stretched.shape().dims(), &[3, 1, 4]);
        let back = stretched.squeeze_axes(&[1])?;
        for i in 0..3 {
            for j in 0..4 {
                assert_eq!(back.get(&[i, j])?, t.get(&[i, j])?);
            }
        }
        Ok(())
    }

    #[test]
    fn expand_aliases_broadcast_elements() -> Result<(), TensorError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[3, 1]), Order::C);
        let e = t.expand(1, 4)?;
        assert_eq!(e.shape().dims(), &[3, 4]);
        for i in 0..3 {
            for j in 0..4 {
                assert_eq!(e.get(&[i, j])?, t.get(&[i, 0])?);
            }
        }
        Ok(())
    }

    #[test]
    fn reshape_view_on_dense() -> Result<(), TensorError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[12]), Order::C);
        let r = t.reshape(Shape::of(&[3, 4]), Order::C)?;
        assert!(r.storage().ptr_eq(t.storage()));
        assert_eq!(r.get(&[1, 2])?, 6.0);
        Ok(())
    }

    #[test]
    fn reshape_copies_non_dense() -> Result<(), TensorError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[4, 4]), Order::C);
        let n = t.narrow(1, true, 0, 2)?;
        let r = n.reshape(Shape::of(&[8]), Order::C)?;
        assert!(!r.storage().ptr_eq(t.storage()));
        assert_eq!(
            r.to_vec(Order::C),
            vec![0.0, 1.0, 4.0, 5.0, 8.0, 9.0, 12.0, 13.0]
        );
        Ok(())
    }

    #[test]
    fn take_single_and_stepped_are_views() -> Result<(), TensorError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[6]), Order::C);
        let single = t.take(0, &[3])?;
        assert!(single.storage().ptr_eq(t.storage()));
        assert_eq!(single.get(&[0])?, 3.0);

        let stepped = t.take(0, &[1, 3, 5])?;
        assert!(stepped.storage().ptr_eq(t.storage()));
        assert_eq!(stepped.to_vec(Order::C), vec![1.0, 3.0, 5.0]);

        let repeated = t.take(0, &[2, 2, 2])?;
        assert!(repeated.storage().ptr_eq(t.storage()));
        assert_eq!(repeated.to_vec(Order::C), vec![2.0, 2.0, 2.0]);
        Ok(())
    }

    #[test]
    fn take_irregular_materializes() -> Result<(), TensorError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[6]), Order::C);
        let taken = t.take(0, &[0, 1, 4])?;
        assert!(!taken.storage().ptr_eq(t.storage()));
        assert_eq!(taken.to_vec(Order::C), vec![0.0, 1.0, 4.0]);
        Ok(())
    }

    #[test]
    fn diag_view_aliases_matrix() -> Result<(), TensorError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[3, 3]), Order::C);
        let mut d = t.diag(0)?;
        assert_eq!(d.to_vec(Order::C), vec![0.0, 4.0, 8.0]);
        d.set(&[1], 100.0)?;
        assert_eq!(t.get(&[1, 1])?, 100.0);
        assert_eq!(t.diag(1)?.to_vec(Order::C), vec![1.0, 5.0]);
        assert_eq!(t.diag(-1)?.to_vec(Order::C), vec![3.0, 7.0]);
        Ok(())
    }

    #[test]
    fn diag_vector_builds_matrix() -> Result<(), TensorError> {
        let engine = engine();
        let v = engine.from_vec(Shape::of(&[2]), Order::C, vec![1.0f64, 2.0])?;
        let m = v.diag(1)?;
        assert_eq!(m.shape().dims(), &[3, 3]);
        assert_eq!(m.get(&[0, 1])?, 1.0);
        assert_eq!(m.get(&[1, 2])?, 2.0);
        assert_eq!(m.get(&[0, 0])?, 0.0);
        Ok(())
    }

    #[test]
    fn copy_roundtrip_between_orders() -> Result<(), TensorError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[3, 4]), Order::C);
        let f = t.copy(Order::F);
        assert_eq!(f.layout().storage_fast_order(), Order::F);
        assert_eq!(f.to_vec(Order::C), t.to_vec(Order::C));
        let c = f.copy(Order::C);
        assert_eq!(c.to_vec(Order::C), t.to_vec(Order::C));
        Ok(())
    }

    #[test]
    fn tiled_copy_matches_direct_copy() -> Result<(), TensorError> {
        // a tiny cache limit forces the tiled parallel path
        let tiled_engine = Engine::with_options(EngineOptions {
            cpu_threads: Some(2),
            l2_cache_bytes: Some(16 * 1024),
        })?;
        let plain_engine = Engine::with_options(EngineOptions {
            cpu_threads: Some(2),
            l2_cache_bytes: Some(1 << 30),
        })?;
        assert!(tiled_engine.copy_limit::<f64>() < 64 * 64);
        assert!(plain_engine.copy_limit::<f64>() > 64 * 64);

        let src = tiled_engine.random::<f64>(Shape::of(&[64, 64]), Order::C, 11);
        let mut tiled_dst = tiled_engine.zeros::<f64>(Shape::of(&[64, 64]), Order::F);
        src.copy_to(&mut tiled_dst)?;

        let src2 = plain_engine.from_vec(Shape::of(&[64, 64]), Order::C, src.to_vec(Order::C))?;
        let mut plain_dst = plain_engine.zeros::<f64>(Shape::of(&[64, 64]), Order::F);
        src2.copy_to(&mut plain_dst)?;

        assert_eq!(tiled_dst.to_vec(Order::C), plain_dst.to_vec(Order::C));
        Ok(())
    }

    #[test]
    fn copy_to_rejects_shape_mismatch() {
        let engine = engine();
        let a = engine.zeros::<f64>(Shape::of(&[2, 3]), Order::C);
        let mut b = engine.zeros::<f64>(Shape::of(&[3, 2]), Order::C);
        assert!(a.copy_to(&mut b).is_err());
    }

    #[test]
    fn ravel_views_dense_copies_strided() -> Result<(), TensorError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[2, 3]), Order::C);
        let r = t.ravel(Order::C);
        assert!(r.storage().ptr_eq(t.storage()));
        assert_eq!(r.shape().dims(), &[6]);

        let p = t.permute(&[1, 0])?;
        let r = p.ravel(Order::C);
        assert!(!r.storage().ptr_eq(t.storage()));
        assert_eq!(r.to_vec(Order::C), vec![0.0, 3.0, 1.0, 4.0, 2.0, 5.0]);
        Ok(())
    }

    #[test]
    fn cast_between_dtypes() -> Result<(), TensorError> {
        let engine = engine();
        let t = engine.seq::<i32>(Shape::of(&[4]), Order::C);
        let f = t.cast::<f64>(Order::C);
        assert_eq!(f.to_vec(Order::C), vec![0.0, 1.0, 2.0, 3.0]);
        Ok(())
    }
}
