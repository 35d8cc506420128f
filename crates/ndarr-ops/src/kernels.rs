//! Per-type kernel table for contiguous runs.
//!
//! The generic execution layer walks loop descriptors and hands every
//! unit-stride run to these kernels as a plain slice. The [`Kernels`] trait
//! carries an unconditional scalar implementation for every operation, so
//! correctness never depends on lane width; the floating point types
//! override the hot entries with `wide` lane groups (`f32x8` / `f64x4`),
//! processing whole lanes via `chunks_exact` and finishing the remainder
//! scalar-wise. NaN-aware kernels exclude NaN lanes with `is_nan` masks and
//! blends instead of branching.

use ndarr_tensor::Element;

/// The elementwise binary combinators runs can be batched over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryKind {
    /// `a + b`
    Add,
    /// `a - b`
    Sub,
    /// `a * b`
    Mul,
    /// `a / b`
    Div,
    /// elementwise minimum
    Min,
    /// elementwise maximum
    Max,
}

impl BinaryKind {
    /// Applies the combinator to two scalars.
    #[inline]
    pub fn apply<T: Element>(self, a: T, b: T) -> T {
        match self {
            BinaryKind::Add => a + b,
            BinaryKind::Sub => a - b,
            BinaryKind::Mul => a * b,
            BinaryKind::Div => a / b,
            BinaryKind::Min => a.minimum(b),
            BinaryKind::Max => a.maximum(b),
        }
    }
}

/// The unary operations with lane-batched implementations.
///
/// Everything else (transcendentals, rounding) runs scalar-wise through its
/// function table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryKind {
    /// absolute value
    Abs,
    /// arithmetic negation
    Neg,
    /// `x * x`
    Sqr,
    /// square root
    Sqrt,
}

impl UnaryKind {
    /// Applies the operation to one scalar.
    #[inline]
    pub fn apply<T: Element>(self, v: T) -> T {
        match self {
            UnaryKind::Abs => v.abs(),
            UnaryKind::Neg => v.neg(),
            UnaryKind::Sqr => v.sqr(),
            UnaryKind::Sqrt => v.sqrt(),
        }
    }
}

/// Contiguous-run kernels, scalar by default, lane-batched for floats.
///
/// All slice arguments are unit-stride runs produced by a loop descriptor.
/// Reduction kernels thread an accumulator so callers can fold across runs.
pub trait Kernels: Element {
    /// Applies a lane-batched unary operation in place.
    fn unary_run(xs: &mut [Self], kind: UnaryKind) {
        for x in xs.iter_mut() {
            *x = kind.apply(*x);
        }
    }

    /// Combines every element with the scalar `v` in place.
    fn binary_scalar_run(xs: &mut [Self], v: Self, kind: BinaryKind) {
        for x in xs.iter_mut() {
            *x = kind.apply(*x, v);
        }
    }

    /// Replaces NaN elements with `v` in place; a no-op for integral types.
    fn fill_nan_run(xs: &mut [Self], v: Self) {
        for x in xs.iter_mut() {
            if x.is_nan() {
                *x = v;
            }
        }
    }

    /// Adds the run sum to `acc`.
    fn sum_run(acc: Self, xs: &[Self]) -> Self {
        xs.iter().fold(acc, |a, &x| a + x)
    }

    /// Adds the run sum over non-NaN elements to `acc`.
    fn nan_sum_run(acc: Self, xs: &[Self]) -> Self {
        xs.iter()
            .fold(acc, |a, &x| if x.is_nan() { a } else { a + x })
    }

    /// Counts the NaN elements of the run.
    fn nan_count_run(xs: &[Self]) -> usize {
        xs.iter().filter(|x| x.is_nan()).count()
    }

    /// Adds `Σ (x - mean)` of the run to `acc` (mean residual pass).
    fn centered_sum_run(acc: Self, xs: &[Self], mean: Self) -> Self {
        xs.iter().fold(acc, |a, &x| a + (x - mean))
    }

    /// Adds `Σ (x - mean)` over non-NaN elements of the run to `acc`.
    fn nan_centered_sum_run(acc: Self, xs: &[Self], mean: Self) -> Self {
        xs.iter()
            .fold(acc, |a, &x| if x.is_nan() { a } else { a + (x - mean) })
    }

    /// Accumulates `(Σ (x - mean)², Σ (x - mean))` over the run.
    fn centered_moments_run(acc: (Self, Self), xs: &[Self], mean: Self) -> (Self, Self) {
        xs.iter().fold(acc, |(s2, s3), &x| {
            let c = x - mean;
            (c.mul_add(c, s2), s3 + c)
        })
    }

    /// The dot product of two equally long runs.
    fn dot_run(a: &[Self], b: &[Self]) -> Self {
        debug_assert_eq!(a.len(), b.len());
        a.iter()
            .zip(b.iter())
            .fold(Self::zero(), |acc, (&x, &y)| x.mul_add(y, acc))
    }
}

impl Kernels for u8 {}
impl Kernels for i32 {}

macro_rules! impl_float_kernels {
    ($t:ty, $vec:ty, $lanes:expr) => {
        impl Kernels for $t {
            fn unary_run(xs: &mut [Self], kind: UnaryKind) {
                let mut chunks = xs.chunks_exact_mut($lanes);
                for chunk in &mut chunks {
                    let v = <$vec>::new(chunk.try_into().expect("chunk is lane-sized"));
                    let r = match kind {
                        UnaryKind::Abs => v.abs(),
                        UnaryKind::Neg => -v,
                        UnaryKind::Sqr => v * v,
                        UnaryKind::Sqrt => v.sqrt(),
                    };
                    chunk.copy_from_slice(&r.to_array());
                }
                for x in chunks.into_remainder() {
                    *x = kind.apply(*x);
                }
            }

            fn binary_scalar_run(xs: &mut [Self], v: Self, kind: BinaryKind) {
                // hardware lane min/max do not propagate NaN like the scalar
                // table does; keep those on the scalar path
                let m = match kind {
                    BinaryKind::Min | BinaryKind::Max => {
                        for x in xs.iter_mut() {
                            *x = kind.apply(*x, v);
                        }
                        return;
                    }
                    _ => <$vec>::splat(v),
                };
                let mut chunks = xs.chunks_exact_mut($lanes);
                for chunk in &mut chunks {
                    let a = <$vec>::new(chunk.try_into().expect("chunk is lane-sized"));
                    let r = match kind {
                        BinaryKind::Add => a + m,
                        BinaryKind::Sub => a - m,
                        BinaryKind::Mul => a * m,
                        BinaryKind::Div => a / m,
                        BinaryKind::Min | BinaryKind::Max => unreachable!(),
                    };
                    chunk.copy_from_slice(&r.to_array());
                }
                for x in chunks.into_remainder() {
                    *x = kind.apply(*x, v);
                }
            }

            fn fill_nan_run(xs: &mut [Self], v: Self) {
                let m = <$vec>::splat(v);
                let mut chunks = xs.chunks_exact_mut($lanes);
                for chunk in &mut chunks {
                    let a = <$vec>::new(chunk.try_into().expect("chunk is lane-sized"));
                    let r = a.is_nan().blend(m, a);
                    chunk.copy_from_slice(&r.to_array());
                }
                for x in chunks.into_remainder() {
                    if x.is_nan() {
                        *x = v;
                    }
                }
            }

            fn sum_run(acc: Self, xs: &[Self]) -> Self {
                let mut lanes = <$vec>::splat(0.0);
                let chunks = xs.chunks_exact($lanes);
                let remainder = chunks.remainder();
                for chunk in chunks {
                    lanes += <$vec>::new(chunk.try_into().expect("chunk is lane-sized"));
                }
                remainder
                    .iter()
                    .fold(acc + lanes.reduce_add(), |a, &x| a + x)
            }

            fn nan_sum_run(acc: Self, xs: &[Self]) -> Self {
                let zero = <$vec>::splat(0.0);
                let mut lanes = zero;
                let chunks = xs.chunks_exact($lanes);
                let remainder = chunks.remainder();
                for chunk in chunks {
                    let a = <$vec>::new(chunk.try_into().expect("chunk is lane-sized"));
                    lanes += a.is_nan().blend(zero, a);
                }
                remainder.iter().fold(acc + lanes.reduce_add(), |a, &x| {
                    if x.is_nan() {
                        a
                    } else {
                        a + x
                    }
                })
            }

            fn nan_count_run(xs: &[Self]) -> usize {
                let one = <$vec>::splat(1.0);
                let zero = <$vec>::splat(0.0);
                let mut lanes = zero;
                let chunks = xs.chunks_exact($lanes);
                let remainder = chunks.remainder();
                for chunk in chunks {
                    let a = <$vec>::new(chunk.try_into().expect("chunk is lane-sized"));
                    lanes += a.is_nan().blend(one, zero);
                }
                lanes.reduce_add() as usize + remainder.iter().filter(|x| x.is_nan()).count()
            }

            fn centered_sum_run(acc: Self, xs: &[Self], mean: Self) -> Self {
                let m = <$vec>::splat(mean);
                let mut lanes = <$vec>::splat(0.0);
                let chunks = xs.chunks_exact($lanes);
                let remainder = chunks.remainder();
                for chunk in chunks {
                    let a = <$vec>::new(chunk.try_into().expect("chunk is lane-sized"));
                    lanes += a - m;
                }
                remainder
                    .iter()
                    .fold(acc + lanes.reduce_add(), |a, &x| a + (x - mean))
            }

            fn nan_centered_sum_run(acc: Self, xs: &[Self], mean: Self) -> Self {
                let zero = <$vec>::splat(0.0);
                let m = <$vec>::splat(mean);
                let mut lanes = zero;
                let chunks = xs.chunks_exact($lanes);
                let remainder = chunks.remainder();
                for chunk in chunks {
                    let a = <$vec>::new(chunk.try_into().expect("chunk is lane-sized"));
                    lanes += a.is_nan().blend(zero, a - m);
                }
                remainder.iter().fold(acc + lanes.reduce_add(), |a, &x| {
                    if x.is_nan() {
                        a
                    } else {
                        a + (x - mean)
                    }
                })
            }

            fn centered_moments_run(
                acc: (Self, Self),
                xs: &[Self],
                mean: Self,
            ) -> (Self, Self) {
                let m = <$vec>::splat(mean);
                let mut lanes2 = <$vec>::splat(0.0);
                let mut lanes3 = <$vec>::splat(0.0);
                let chunks = xs.chunks_exact($lanes);
                let remainder = chunks.remainder();
                for chunk in chunks {
                    let a = <$vec>::new(chunk.try_into().expect("chunk is lane-sized"));
                    let c = a - m;
                    lanes2 = c.mul_add(c, lanes2);
                    lanes3 += c;
                }
                let (mut s2, mut s3) = (acc.0 + lanes2.reduce_add(), acc.1 + lanes3.reduce_add());
                for &x in remainder {
                    let c = x - mean;
                    s2 = c.mul_add(c, s2);
                    s3 += c;
                }
                (s2, s3)
            }

            fn dot_run(a: &[Self], b: &[Self]) -> Self {
                debug_assert_eq!(a.len(), b.len());
                let mut lanes = <$vec>::splat(0.0);
                let split = a.len() - a.len() % $lanes;
                for (ca, cb) in a[..split]
                    .chunks_exact($lanes)
                    .zip(b[..split].chunks_exact($lanes))
                {
                    let va = <$vec>::new(ca.try_into().expect("chunk is lane-sized"));
                    let vb = <$vec>::new(cb.try_into().expect("chunk is lane-sized"));
                    lanes = va.mul_add(vb, lanes);
                }
                let mut sum = lanes.reduce_add();
                for (&x, &y) in a[split..].iter().zip(b[split..].iter()) {
                    sum = x.mul_add(y, sum);
                }
                sum
            }
        }
    };
}

impl_float_kernels!(f32, wide::f32x8, 8);
impl_float_kernels!(f64, wide::f64x4, 4);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unary_run_matches_scalar() {
        // 11 elements exercises both the lane groups and the remainder
        let mut simd: Vec<f32> = (0..11).map(|i| i as f32 - 5.0).collect();
        let expected: Vec<f32> = simd.iter().map(|x| x.abs()).collect();
        f32::unary_run(&mut simd, UnaryKind::Abs);
        assert_eq!(simd, expected);
    }

    #[test]
    fn binary_scalar_run_all_kinds() {
        for kind in [
            BinaryKind::Add,
            BinaryKind::Sub,
            BinaryKind::Mul,
            BinaryKind::Div,
            BinaryKind::Min,
            BinaryKind::Max,
        ] {
            let mut simd: Vec<f64> = (0..9).map(|i| i as f64 + 1.0).collect();
            let expected: Vec<f64> = simd.iter().map(|&x| kind.apply(x, 2.5)).collect();
            f64::binary_scalar_run(&mut simd, 2.5, kind);
            assert_eq!(simd, expected);
        }
    }

    #[test]
    fn sum_run_matches_reference() {
        let xs: Vec<f64> = (0..100).map(|i| i as f64).collect();
        assert_relative_eq!(f64::sum_run(0.0, &xs), 4950.0);
        let xs: Vec<f32> = (0..13).map(|i| i as f32).collect();
        assert_relative_eq!(f32::sum_run(1.0, &xs), 79.0);
    }

    #[test]
    fn nan_kernels_exclude_nans() {
        let mut xs: Vec<f64> = (0..10).map(|i| i as f64).collect();
        xs[3] = f64::NAN;
        xs[8] = f64::NAN;
        assert_eq!(f64::nan_count_run(&xs), 2);
        assert_relative_eq!(f64::nan_sum_run(0.0, &xs), 45.0 - 3.0 - 8.0);

        let mut filled = xs.clone();
        f64::fill_nan_run(&mut filled, -1.0);
        assert_eq!(filled[3], -1.0);
        assert_eq!(filled[8], -1.0);
        assert_eq!(filled[0], 0.0);
    }

    #[test]
    fn dot_run_matches_reference() {
        let a: Vec<f32> = (0..19).map(|i| i as f32).collect();
        let b: Vec<f32> = (0..19).map(|i| (i * 2) as f32).collect();
        let expected: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        assert_relative_eq!(f32::dot_run(&a, &b), expected);
    }

    #[test]
    fn centered_moments_match_reference() {
        let xs: Vec<f64> = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let (s2, s3) = f64::centered_moments_run((0.0, 0.0), &xs, 3.0);
        assert_relative_eq!(s2, 10.0);
        assert_relative_eq!(s3, 0.0);
    }

    #[test]
    fn integral_kernels_stay_scalar() {
        let mut xs = vec![1i32, -2, 3];
        i32::unary_run(&mut xs, UnaryKind::Abs);
        assert_eq!(xs, vec![1, 2, 3]);
        assert_eq!(i32::sum_run(0, &[1, 2, 3]), 6);
    }
}
