//! Execution plans: contiguous-run decomposition of strided traversals.

use crate::layout::StrideLayout;
use crate::order::Order;

/// The minimal set of contiguous runs visiting every element of a layout
/// exactly once in a given traversal order.
///
/// Each run starts at one of `offsets` and visits `bound` elements `step`
/// pointers apart. Bulk operations walk runs instead of re-deriving stride
/// arithmetic per element; a dense layout collapses to a single run.
///
/// `simd_bound` is the largest index up to which full lane-width groups of
/// `simd_len` elements apply; it is nonzero only for unit-step runs of types
/// whose storage supports SIMD lanes. The remainder `simd_bound..bound` is
/// always processed scalar-wise.
///
/// Descriptors are ephemeral: recomputed whenever the traversal order or the
/// layout changes, at O(rank) cost, never per element.
#[derive(Debug, Clone)]
pub struct LoopDescriptor {
    /// Start pointer of every run, in traversal order.
    pub offsets: Vec<usize>,
    /// Pointer distance between consecutive elements of a run.
    pub step: usize,
    /// Number of elements in every run.
    pub bound: usize,
    /// SIMD lane width of the element type; 1 when scalar-only.
    pub simd_len: usize,
    /// Largest multiple of `simd_len` not exceeding `bound`, or 0 when the
    /// run cannot be lane-batched (non-unit step or scalar-only type).
    pub simd_bound: usize,
}

impl LoopDescriptor {
    /// Builds the descriptor for `layout` traversed in `order`.
    ///
    /// `lanes` is the element type's lane-width capability
    /// (`Element::LANES`); pass 1 to force scalar traversal.
    pub fn of(layout: &StrideLayout, order: Order, lanes: usize) -> LoopDescriptor {
        let compact = layout.compute_fortran_layout(order, true);

        if compact.rank() == 0 {
            return LoopDescriptor {
                offsets: vec![compact.offset()],
                step: 1,
                bound: 1,
                simd_len: lanes.max(1),
                simd_bound: 0,
            };
        }

        let bound = compact.dim(0);
        let step = compact.stride(0);

        let outer: usize = (1..compact.rank()).map(|axis| compact.dim(axis)).product();
        let mut offsets = Vec::with_capacity(outer);
        if (1..compact.rank()).all(|axis| compact.dim(axis) > 0) {
            let mut index = vec![0usize; compact.rank() - 1];
            loop {
                let mut offset = compact.offset();
                for (j, &i) in index.iter().enumerate() {
                    offset += i * compact.stride(j + 1);
                }
                offsets.push(offset);
                // increment the outer index, fastest axis first
                let mut axis = 0;
                loop {
                    if axis == index.len() {
                        break;
                    }
                    index[axis] += 1;
                    if index[axis] < compact.dim(axis + 1) {
                        break;
                    }
                    index[axis] = 0;
                    axis += 1;
                }
                if axis == index.len() {
                    break;
                }
            }
        }

        let simd_len = lanes.max(1);
        let simd_bound = if step == 1 && simd_len > 1 {
            bound - bound % simd_len
        } else {
            0
        };

        LoopDescriptor {
            offsets,
            step,
            bound,
            simd_len,
            simd_bound,
        }
    }

    /// Returns the total number of elements the descriptor visits.
    #[inline]
    pub fn size(&self) -> usize {
        self.offsets.len() * self.bound
    }
}

/// Iterates the flat pointers of a layout in a given traversal order.
///
/// Backed by a [`LoopDescriptor`], so stride arithmetic is derived once and
/// every pointer costs O(1).
pub struct PointerIterator {
    plan: LoopDescriptor,
    run: usize,
    i: usize,
}

impl PointerIterator {
    /// Creates an iterator over all pointers of `layout` in `order`.
    pub fn new(layout: &StrideLayout, order: Order) -> PointerIterator {
        PointerIterator {
            plan: LoopDescriptor::of(layout, order, 1),
            run: 0,
            i: 0,
        }
    }

    /// Returns the total number of pointers the iterator will yield.
    #[inline]
    pub fn size(&self) -> usize {
        self.plan.size()
    }
}

impl Iterator for PointerIterator {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.plan.bound == 0 || self.run >= self.plan.offsets.len() {
            return None;
        }
        let p = self.plan.offsets[self.run] + self.i * self.plan.step;
        self.i += 1;
        if self.i == self.plan.bound {
            self.i = 0;
            self.run += 1;
        }
        Some(p)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let done = self.run * self.plan.bound + self.i;
        let left = self.plan.size() - done;
        (left, Some(left))
    }
}
