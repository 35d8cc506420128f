//! Linear-algebra primitives: dot products, matrix-vector and the
//! cache-blocked parallel matrix product.

use ndarr_tensor::{Order, Shape, Tensor};

use crate::error::OpsError;
use crate::kernels::Kernels;

fn shape_error<T: Kernels>(message: &str, a: &Tensor<T>, b: &Tensor<T>) -> OpsError {
    OpsError::Tensor(ndarr_tensor::TensorError::dimension_mismatch(
        message,
        a.shape().dims(),
        b.shape().dims(),
    ))
}

/// Dot product over the pointer ranges of two rank-1 views; preconditions
/// are validated by the callers, so this never fails.
fn dot_range<T: Kernels>(a: &Tensor<T>, b: &Tensor<T>, start: usize, end: usize) -> T {
    let o1 = a.layout().offset();
    let s1 = a.layout().stride(0);
    let o2 = b.layout().offset();
    let s2 = b.layout().stride(0);
    let len = end - start;
    if s1 == 1 && s2 == 1 && T::LANES > 1 {
        // SAFETY: dot products only read; the ranges stay inside both
        // storages because start/end were validated against the shapes.
        let ra = unsafe { a.storage().run(o1 + start, len) };
        let rb = unsafe { b.storage().run(o2 + start, len) };
        return T::dot_run(ra, rb);
    }
    let mut acc = T::zero();
    for i in start..end {
        acc = a
            .storage()
            .get(o1 + i * s1)
            .mul_add(b.storage().get(o2 + i * s2), acc);
    }
    acc
}

/// Inner (dot) product of two equally sized vectors over `[start, end)`.
pub(crate) fn inner_range<T: Kernels>(
    a: &Tensor<T>,
    b: &Tensor<T>,
    start: usize,
    end: usize,
) -> Result<T, OpsError> {
    if a.rank() != 1 || b.rank() != 1 || a.dim(0) != b.dim(0) {
        return Err(shape_error(
            "Operands are not valid for a vector dot product",
            a,
            b,
        ));
    }
    if start >= end || end > b.dim(0) {
        return Err(OpsError::invalid_argument(format!(
            "Start and end indexes are invalid (start: {start}, end: {end})."
        )));
    }
    Ok(dot_range(a, b, start, end))
}

/// Inner (dot) product of two equally sized vectors.
pub(crate) fn inner<T: Kernels>(a: &Tensor<T>, b: &Tensor<T>) -> Result<T, OpsError> {
    if a.rank() != 1 || b.rank() != 1 || a.dim(0) != b.dim(0) {
        return Err(shape_error(
            "Operands are not valid for a vector dot product",
            a,
            b,
        ));
    }
    if a.dim(0) == 0 {
        return Ok(T::zero());
    }
    Ok(dot_range(a, b, 0, a.dim(0)))
}

/// Matrix-vector product: `(m, n) × (n) → (m)`.
pub(crate) fn mv<T: Kernels>(a: &Tensor<T>, x: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
    if a.rank() != 2 || x.rank() != 1 || a.dim(1) != x.dim(0) {
        return Err(shape_error(
            "Operands are not valid for matrix-vector multiplication",
            a,
            x,
        ));
    }
    let mut result = a
        .engine()
        .zeros::<T>(Shape::of(&[a.dim(0)]), Order::default_order());
    for i in 0..a.dim(0) {
        let row = a.select(0, i)?;
        result.ptr_set(i, dot_range(&row, x, 0, x.dim(0)));
    }
    Ok(result)
}

/// Vector-transpose-matrix product: `(n) × (n, p) → (p)`.
pub(crate) fn vtm<T: Kernels>(x: &Tensor<T>, a: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
    if x.rank() != 1 || a.rank() != 2 || x.dim(0) != a.dim(0) {
        return Err(shape_error(
            "Operands are not valid for vector transpose matrix multiplication",
            x,
            a,
        ));
    }
    let mut result = a
        .engine()
        .zeros::<T>(Shape::of(&[a.dim(1)]), Order::default_order());
    for j in 0..a.dim(1) {
        let col = a.select(1, j)?;
        result.ptr_set(j, dot_range(x, &col, 0, x.dim(0)));
    }
    Ok(result)
}

/// The cache-derived tile extents of the blocked matrix product.
///
/// `chunk` is sized so one row panel and one column panel fit in L2
/// together: `floor(sqrt(L2 / 2 / threads / bytes))`, rounded down to a
/// multiple of 8 once it reaches 8. Past a chunk of 64 the k-extent is
/// widened fourfold to amortize the inner dot-product call, and the row/col
/// extent shrinks accordingly.
fn mm_chunks<T: Kernels>(engine: &ndarr_tensor::Engine) -> (usize, usize) {
    let l2 = engine.l2_cache_bytes() as f64;
    let threads = engine.cpu_threads() as f64;
    let bytes = T::DTYPE.byte_count() as f64;
    let mut chunk = (l2 / 2.0 / threads / bytes).sqrt().floor() as usize;
    if chunk >= 8 {
        chunk -= chunk % 8;
    }
    let vector_chunk = if chunk > 64 { chunk * 4 } else { chunk };
    let inner_chunk = if chunk > 64 {
        (chunk as f64 / 4.0).sqrt().ceil() as usize
    } else {
        (chunk as f64).sqrt().ceil() as usize
    };
    (vector_chunk.max(1), inner_chunk.max(1))
}

/// Dense matrix product `(m, n) × (n, p) → (m, p)`.
///
/// A 3-level blocked loop (row-block × col-block × k-block) with extents
/// from [`mm_chunks`]. Row-blocks are submitted to the engine pool, one task
/// per row range, and joined before returning; each task walks its row, col
/// and k tiles, accumulating `inner(col_j, k, k_end)` into the destination
/// cell. Blocks write disjoint row ranges of the destination, so no
/// synchronization is needed.
pub(crate) fn mm<T: Kernels>(a: &Tensor<T>, b: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
    if a.rank() != 2 || b.rank() != 2 || a.dim(1) != b.dim(0) {
        return Err(shape_error(
            "Operands are not valid for matrix-matrix multiplication",
            a,
            b,
        ));
    }
    let to = a
        .engine()
        .zeros::<T>(Shape::of(&[a.dim(0), b.dim(1)]), Order::default_order());
    mm_into(a, b, &to)?;
    Ok(to)
}

fn mm_into<T: Kernels>(a: &Tensor<T>, b: &Tensor<T>, to: &Tensor<T>) -> Result<(), OpsError> {
    let m = a.dim(0);
    let n = a.dim(1);
    let p = b.dim(1);

    let rows = a.unbind(0, false)?;
    let cols = b.unbind(1, false)?;

    let engine = a.engine();
    let (vector_chunk, inner_chunk) = mm_chunks::<T>(engine);
    log::debug!("mm {m}x{n}x{p}: inner chunk {inner_chunk}, k chunk {vector_chunk}");

    let off = to.layout().offset();
    let i_stride = to.layout().stride(0);
    let j_stride = to.layout().stride(1);

    let rows_ref = &rows;
    let cols_ref = &cols;
    engine.pool().scope(|scope| {
        let mut r = 0;
        while r < m {
            let re = m.min(r + inner_chunk);
            scope.spawn(move |_| {
                let mut c = 0;
                while c < p {
                    let ce = p.min(c + inner_chunk);
                    let mut k = 0;
                    while k < n {
                        let k_end = n.min(k + vector_chunk);
                        for i in r..re {
                            let krow = &rows_ref[i];
                            for (j, col) in cols_ref.iter().enumerate().take(ce).skip(c) {
                                let partial = dot_range(krow, col, k, k_end);
                                to.storage().inc(off + i * i_stride + j * j_stride, partial);
                            }
                        }
                        k = k_end;
                    }
                    c = ce;
                }
            });
            r = re;
        }
    });
    Ok(())
}

/// Batched matrix-vector product with degenerate-batch-axis normalization.
pub(crate) fn bmv<T: Kernels>(a: &Tensor<T>, x: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
    if a.rank() == 2 && x.rank() == 1 && a.dim(1) == x.dim(0) {
        // no batch on either side: batch of one
        return bmv_batched(&a.stretch(&[0])?, &x.stretch(&[0])?);
    }
    if a.rank() == 3 && x.rank() == 1 && a.dim(2) == x.dim(0) {
        // batch on the matrix, broadcast the vector
        return bmv_batched(a, &x.strexp(0, a.dim(0))?);
    }
    if a.rank() == 2 && x.rank() == 2 && a.dim(1) == x.dim(1) {
        // batch on the vector, broadcast the matrix
        return bmv_batched(&a.strexp(0, x.dim(0))?, x);
    }
    if a.rank() == 3 && x.rank() == 2 && a.dim(2) == x.dim(1) && a.dim(0) == x.dim(0) {
        return bmv_batched(a, x);
    }
    Err(shape_error(
        "Operands are not valid for batch matrix-vector multiplication",
        a,
        x,
    ))
}

fn bmv_batched<T: Kernels>(a: &Tensor<T>, x: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
    let res = a
        .engine()
        .zeros::<T>(Shape::of(&[a.dim(0), a.dim(1)]), Order::default_order());
    for batch in 0..a.dim(0) {
        let out = mv(&a.select(0, batch)?, &x.select(0, batch)?)?;
        let mut dst = res.select(0, batch)?;
        out.copy_to(&mut dst)?;
    }
    Ok(res)
}

/// Batched vector-transpose-matrix product.
pub(crate) fn bvtm<T: Kernels>(x: &Tensor<T>, a: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
    if x.rank() == 1 && a.rank() == 2 && x.dim(0) == a.dim(0) {
        return bvtm_batched(&x.stretch(&[0])?, &a.stretch(&[0])?);
    }
    if x.rank() == 2 && a.rank() == 2 && x.dim(1) == a.dim(0) {
        // a batch of row vectors against one matrix is just mm
        return mm(x, a);
    }
    if x.rank() == 1 && a.rank() == 3 && x.dim(0) == a.dim(1) {
        return bvtm_batched(&x.strexp(0, a.dim(0))?, a);
    }
    if x.rank() == 2 && a.rank() == 3 && x.dim(1) == a.dim(1) && x.dim(0) == a.dim(0) {
        return bvtm_batched(x, a);
    }
    Err(shape_error(
        "Operands are not valid for batch vector transpose matrix multiplication",
        x,
        a,
    ))
}

fn bvtm_batched<T: Kernels>(x: &Tensor<T>, a: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
    let res = a
        .engine()
        .zeros::<T>(Shape::of(&[x.dim(0), a.dim(2)]), Order::default_order());
    for batch in 0..x.dim(0) {
        let out = vtm(&x.select(0, batch)?, &a.select(0, batch)?)?;
        let mut dst = res.select(0, batch)?;
        out.copy_to(&mut dst)?;
    }
    Ok(res)
}

/// Batched matrix product with degenerate-batch-axis normalization.
pub(crate) fn bmm<T: Kernels>(a: &Tensor<T>, b: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
    if a.rank() == 2 && b.rank() == 2 && a.dim(1) == b.dim(0) {
        return bmm_batched(&a.stretch(&[0])?, &b.stretch(&[0])?);
    }
    if a.rank() == 3 && b.rank() == 2 && a.dim(2) == b.dim(0) {
        return bmm_batched(a, &b.strexp(0, a.dim(0))?);
    }
    if a.rank() == 2 && b.rank() == 3 && a.dim(1) == b.dim(1) {
        return bmm_batched(&a.strexp(0, b.dim(0))?, b);
    }
    if a.rank() == 3 && b.rank() == 3 && a.dim(0) == b.dim(0) && a.dim(2) == b.dim(1) {
        return bmm_batched(a, b);
    }
    Err(shape_error(
        "Operands are not valid for batch matrix-matrix multiplication",
        a,
        b,
    ))
}

fn bmm_batched<T: Kernels>(a: &Tensor<T>, b: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
    let res = a.engine().zeros::<T>(
        Shape::of(&[a.dim(0), a.dim(1), b.dim(2)]),
        Order::default_order(),
    );
    for batch in 0..a.dim(0) {
        let dst = res.select(0, batch)?;
        mm_into(&a.select(0, batch)?, &b.select(0, batch)?, &dst)?;
    }
    Ok(res)
}

/// Sum of the main diagonal of a square matrix.
pub(crate) fn trace<T: Kernels>(t: &Tensor<T>) -> Result<T, OpsError> {
    if t.rank() != 2 {
        return Err(OpsError::invalid_argument(
            "Trace is only available on a matrix.",
        ));
    }
    if t.dim(0) != t.dim(1) {
        return Err(OpsError::invalid_argument(
            "Trace is only available on a square matrix.",
        ));
    }
    let mut acc = T::zero();
    for i in 0..t.dim(0) {
        acc = acc + t.get(&[i, i])?;
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarr_tensor::{Engine, EngineOptions};

    fn engine() -> Engine {
        Engine::new().unwrap()
    }

    #[test]
    fn inner_products() -> Result<(), OpsError> {
        let engine = engine();
        let a = engine.seq::<f64>(Shape::of(&[20]), Order::C);
        let b = engine.full::<f64>(Shape::of(&[20]), Order::C, 2.0);
        assert_relative_eq!(inner(&a, &b)?, 2.0 * 190.0);
        assert_relative_eq!(inner_range(&a, &b, 5, 10)?, 2.0 * (5 + 6 + 7 + 8 + 9) as f64);
        assert!(inner_range(&a, &b, 10, 5).is_err());
        Ok(())
    }

    #[test]
    fn inner_on_strided_views() -> Result<(), OpsError> {
        let engine = engine();
        let m = engine.seq::<f64>(Shape::of(&[4, 4]), Order::C);
        let col = m.select(1, 1)?;
        let row = m.select(0, 1)?;
        // col = [1, 5, 9, 13], row = [4, 5, 6, 7]
        assert_relative_eq!(inner(&col, &row)?, 4.0 + 25.0 + 54.0 + 91.0);
        Ok(())
    }

    #[test]
    fn mv_and_vtm() -> Result<(), OpsError> {
        let engine = engine();
        let a = engine.from_vec(
            Shape::of(&[2, 3]),
            Order::C,
            vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0],
        )?;
        let x = engine.from_vec(Shape::of(&[3]), Order::C, vec![1.0f64, 0.0, 2.0])?;
        assert_eq!(mv(&a, &x)?.to_vec(Order::C), vec![7.0, 16.0]);

        let y = engine.from_vec(Shape::of(&[2]), Order::C, vec![1.0f64, 2.0])?;
        assert_eq!(vtm(&y, &a)?.to_vec(Order::C), vec![9.0, 12.0, 15.0]);
        Ok(())
    }

    #[test]
    fn mm_matches_reference_triple_loop() -> Result<(), OpsError> {
        let engine = engine();
        let a = engine.from_vec(
            Shape::of(&[2, 3]),
            Order::C,
            vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0],
        )?;
        let b = engine.from_vec(
            Shape::of(&[3, 2]),
            Order::C,
            vec![7.0f64, 8.0, 9.0, 10.0, 11.0, 12.0],
        )?;
        let c = mm(&a, &b)?;
        assert_eq!(c.shape().dims(), &[2, 2]);
        assert_eq!(c.to_vec(Order::C), vec![58.0, 64.0, 139.0, 154.0]);

        let bad = engine.zeros::<f64>(Shape::of(&[4, 2]), Order::C);
        assert!(mm(&a, &bad).is_err());
        Ok(())
    }

    #[test]
    fn mm_blocked_equals_unblocked() -> Result<(), OpsError> {
        // a tiny cache forces many small tiles; a huge one a single tile
        let small = Engine::with_options(EngineOptions {
            cpu_threads: Some(3),
            l2_cache_bytes: Some(2048),
        })
        .unwrap();
        let large = Engine::with_options(EngineOptions {
            cpu_threads: Some(1),
            l2_cache_bytes: Some(1 << 28),
        })
        .unwrap();

        let n = 37;
        let a1 = small.random::<f64>(Shape::of(&[n, n]), Order::C, 5);
        let b1 = small.random::<f64>(Shape::of(&[n, n]), Order::C, 6);
        let c1 = mm(&a1, &b1)?;

        let a2 = large.from_vec(Shape::of(&[n, n]), Order::C, a1.to_vec(Order::C))?;
        let b2 = large.from_vec(Shape::of(&[n, n]), Order::C, b1.to_vec(Order::C))?;
        let c2 = mm(&a2, &b2)?;

        for (x, y) in c1.to_vec(Order::C).into_iter().zip(c2.to_vec(Order::C)) {
            assert_relative_eq!(x, y, epsilon = 1e-9, max_relative = 1e-9);
        }
        Ok(())
    }

    #[test]
    fn mm_integer() -> Result<(), OpsError> {
        let engine = engine();
        let a = engine.from_vec(Shape::of(&[2, 2]), Order::C, vec![1i32, 2, 3, 4])?;
        let b = engine.from_vec(Shape::of(&[2, 2]), Order::C, vec![5i32, 6, 7, 8])?;
        assert_eq!(mm(&a, &b)?.to_vec(Order::C), vec![19, 22, 43, 50]);
        Ok(())
    }

    #[test]
    fn bmm_normalizes_ranks() -> Result<(), OpsError> {
        let engine = engine();
        let a = engine.seq::<f64>(Shape::of(&[2, 2, 3]), Order::C);
        let b = engine.seq::<f64>(Shape::of(&[3, 2]), Order::C);
        let c = bmm(&a, &b)?;
        assert_eq!(c.shape().dims(), &[2, 2, 2]);
        // batch 0 equals the plain product of the first matrix
        let c0 = mm(&a.select(0, 0)?, &b)?;
        assert_eq!(c.select(0, 0)?.to_vec(Order::C), c0.to_vec(Order::C));
        Ok(())
    }

    #[test]
    fn bmv_normalizes_ranks() -> Result<(), OpsError> {
        let engine = engine();
        let a = engine.seq::<f64>(Shape::of(&[2, 3]), Order::C);
        let x = engine.from_vec(Shape::of(&[3]), Order::C, vec![1.0f64, 1.0, 1.0])?;
        let r = bmv(&a, &x)?;
        assert_eq!(r.shape().dims(), &[1, 2]);
        assert_eq!(r.to_vec(Order::C), vec![3.0, 12.0]);

        let batched = engine.seq::<f64>(Shape::of(&[2, 2, 3]), Order::C);
        let r = bmv(&batched, &x)?;
        assert_eq!(r.shape().dims(), &[2, 2]);
        assert_eq!(r.to_vec(Order::C), vec![3.0, 12.0, 21.0, 30.0]);
        Ok(())
    }

    #[test]
    fn bvtm_normalizes_ranks() -> Result<(), OpsError> {
        let engine = engine();
        let a = engine.seq::<f64>(Shape::of(&[2, 3, 2]), Order::C);
        let x = engine.from_vec(Shape::of(&[3]), Order::C, vec![1.0f64, 1.0, 1.0])?;
        let r = bvtm(&x, &a)?;
        assert_eq!(r.shape().dims(), &[2, 2]);
        assert_eq!(r.to_vec(Order::C), vec![6.0, 9.0, 24.0, 27.0]);
        Ok(())
    }

    #[test]
    fn trace_square_only() -> Result<(), OpsError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[3, 3]), Order::C);
        assert_relative_eq!(trace(&t)?, 0.0 + 4.0 + 8.0);
        let r = engine.zeros::<f64>(Shape::of(&[2, 3]), Order::C);
        assert!(trace(&r).is_err());
        Ok(())
    }
}
