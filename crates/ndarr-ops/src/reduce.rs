//! Reductions: associative combines, compensated moments, NaN-aware
//! variants and batched per-axis dispatch.

use ndarr_tensor::{Element, Order, Shape, StrideLayout, Tensor};

use crate::error::OpsError;
use crate::kernels::Kernels;

/// Batch size for per-axis reduction dispatch: each worker task processes
/// this many independent 1-D reductions.
const REDUCE_BATCH: usize = 128;

fn require_float<T: Element>(operation: &str) -> Result<(), OpsError> {
    if !T::FLOATING {
        return Err(OpsError::unsupported_dtype(operation, T::DTYPE));
    }
    Ok(())
}

fn require_nonempty<T: Element>(t: &Tensor<T>, operation: &str) -> Result<(), OpsError> {
    if t.size() == 0 {
        return Err(OpsError::EmptyReduction(operation.to_string()));
    }
    Ok(())
}

/// Folds every run of `t` in storage order, using the run kernel on
/// unit-stride runs and the scalar combine otherwise.
fn fold_runs<T: Kernels, A>(
    t: &Tensor<T>,
    init: A,
    run: impl Fn(A, &[T]) -> A,
    scalar: impl Fn(A, T) -> A,
) -> A {
    let plan = t.loop_descriptor(Order::S);
    let storage = t.storage();
    let mut acc = init;
    for &offset in &plan.offsets {
        if plan.step == 1 {
            // SAFETY: reductions only read; no writer overlaps the run
            // during the call under the aliased-mutation contract.
            let slice = unsafe { storage.run(offset, plan.bound) };
            acc = run(acc, slice);
        } else {
            let mut p = offset;
            for _ in 0..plan.bound {
                acc = scalar(acc, storage.get(p));
                p += plan.step;
            }
        }
    }
    acc
}

/// Sum over all elements; 0 for an empty tensor.
pub(crate) fn sum<T: Kernels>(t: &Tensor<T>) -> T {
    fold_runs(t, T::zero(), |a, xs| T::sum_run(a, xs), |a, x| a + x)
}

/// Sum excluding NaN elements.
pub(crate) fn nan_sum<T: Kernels>(t: &Tensor<T>) -> Result<T, OpsError> {
    require_float::<T>("nan_sum")?;
    Ok(fold_runs(
        t,
        T::zero(),
        |a, xs| T::nan_sum_run(a, xs),
        |a, x| if x.is_nan() { a } else { a + x },
    ))
}

/// Product over all elements; 1 for an empty tensor.
pub(crate) fn prod<T: Kernels>(t: &Tensor<T>) -> T {
    fold_runs(
        t,
        T::one(),
        |a, xs| xs.iter().fold(a, |a, &x| a * x),
        |a, x| a * x,
    )
}

/// Product excluding NaN elements.
pub(crate) fn nan_prod<T: Kernels>(t: &Tensor<T>) -> Result<T, OpsError> {
    require_float::<T>("nan_prod")?;
    Ok(fold_runs(
        t,
        T::one(),
        |a, xs| {
            xs.iter()
                .fold(a, |a, &x| if x.is_nan() { a } else { a * x })
        },
        |a, x| if x.is_nan() { a } else { a * x },
    ))
}

/// Minimum over all elements; NaN inputs propagate for floating dtypes.
pub(crate) fn min<T: Kernels>(t: &Tensor<T>) -> Result<T, OpsError> {
    require_nonempty(t, "min")?;
    let acc = fold_runs(
        t,
        None,
        |a: Option<T>, xs| {
            xs.iter()
                .fold(a, |a, &x| Some(a.map_or(x, |m| m.minimum(x))))
        },
        |a, x| Some(a.map_or(x, |m| m.minimum(x))),
    );
    acc.ok_or_else(|| OpsError::EmptyReduction("min".to_string()))
}

/// Maximum over all elements; NaN inputs propagate for floating dtypes.
pub(crate) fn max<T: Kernels>(t: &Tensor<T>) -> Result<T, OpsError> {
    require_nonempty(t, "max")?;
    let acc = fold_runs(
        t,
        None,
        |a: Option<T>, xs| {
            xs.iter()
                .fold(a, |a, &x| Some(a.map_or(x, |m| m.maximum(x))))
        },
        |a, x| Some(a.map_or(x, |m| m.maximum(x))),
    );
    acc.ok_or_else(|| OpsError::EmptyReduction("max".to_string()))
}

fn nan_min_max<T: Kernels>(t: &Tensor<T>, want_min: bool) -> Result<T, OpsError> {
    require_float::<T>(if want_min { "nan_min" } else { "nan_max" })?;
    require_nonempty(t, if want_min { "nan_min" } else { "nan_max" })?;
    let acc = fold_runs(
        t,
        None,
        |a: Option<T>, xs| {
            xs.iter().fold(a, |a, &x| {
                if x.is_nan() {
                    a
                } else {
                    Some(a.map_or(
                        x,
                        |m| if want_min { m.minimum(x) } else { m.maximum(x) },
                    ))
                }
            })
        },
        |a, x| {
            if x.is_nan() {
                a
            } else {
                Some(a.map_or(
                    x,
                    |m| if want_min { m.minimum(x) } else { m.maximum(x) },
                ))
            }
        },
    );
    // every element NaN: the NaN-aware result is NaN itself
    Ok(acc.unwrap_or_else(|| T::from_f64(f64::NAN)))
}

/// Minimum excluding NaN elements.
pub(crate) fn nan_min<T: Kernels>(t: &Tensor<T>) -> Result<T, OpsError> {
    nan_min_max(t, true)
}

/// Maximum excluding NaN elements.
pub(crate) fn nan_max<T: Kernels>(t: &Tensor<T>) -> Result<T, OpsError> {
    nan_min_max(t, false)
}

/// Arithmetic mean via the three-pass compensated algorithm.
///
/// Pass 1 computes the raw mean; pass 2 folds the residual
/// `Σ (x - mean) / n` back into it, guarding against single-pass summation
/// error for large element counts.
pub(crate) fn mean<T: Kernels>(t: &Tensor<T>) -> Result<T, OpsError> {
    require_float::<T>("mean")?;
    require_nonempty(t, "mean")?;
    let count = T::from_f64(t.size() as f64);
    let raw = sum(t) / count;
    let residual = fold_runs(
        t,
        T::zero(),
        |a, xs| T::centered_sum_run(a, xs, raw),
        |a, x| a + (x - raw),
    );
    Ok(raw + residual / count)
}

/// Mean excluding NaN elements, with the same residual correction.
pub(crate) fn nan_mean<T: Kernels>(t: &Tensor<T>) -> Result<T, OpsError> {
    require_float::<T>("nan_mean")?;
    require_nonempty(t, "nan_mean")?;
    let present = t.size() - nan_count(t);
    if present == 0 {
        return Ok(T::from_f64(f64::NAN));
    }
    let count = T::from_f64(present as f64);
    let raw = nan_sum(t)? / count;
    let residual = fold_runs(
        t,
        T::zero(),
        |a, xs| T::nan_centered_sum_run(a, xs, raw),
        |a, x| if x.is_nan() { a } else { a + (x - raw) },
    );
    Ok(raw + residual / count)
}

/// Variance around `mean_hint` (or the computed mean), with `ddof` delta
/// degrees of freedom.
///
/// The final pass accumulates both `Σ (x - mean)²` and `Σ (x - mean)`, and
/// the squared centered sum corrects the result:
/// `(Σc² - (Σc)² / (n - ddof)) / (n - ddof)`.
pub(crate) fn var<T: Kernels>(
    t: &Tensor<T>,
    ddof: usize,
    mean_hint: Option<T>,
) -> Result<T, OpsError> {
    require_float::<T>("var")?;
    require_nonempty(t, "var")?;
    if ddof >= t.size() {
        return Err(OpsError::invalid_argument(format!(
            "ddof {ddof} must be smaller than the number of elements {}.",
            t.size()
        )));
    }
    let m = match mean_hint {
        Some(m) => m,
        None => mean(t)?,
    };
    let (s2, s3) = fold_runs(
        t,
        (T::zero(), T::zero()),
        |a, xs| T::centered_moments_run(a, xs, m),
        |(s2, s3), x| {
            let c = x - m;
            (c.mul_add(c, s2), s3 + c)
        },
    );
    let denom = T::from_f64((t.size() - ddof) as f64);
    Ok((s2 - (s3 * s3) / denom) / denom)
}

/// Standard deviation: the square root of [`var`].
pub(crate) fn std<T: Kernels>(t: &Tensor<T>, ddof: usize) -> Result<T, OpsError> {
    Ok(var(t, ddof, None)?.sqrt())
}

/// Number of NaN elements; always 0 for integral dtypes.
pub(crate) fn nan_count<T: Kernels>(t: &Tensor<T>) -> usize {
    fold_runs(
        t,
        0usize,
        |a, xs| a + T::nan_count_run(xs),
        |a, x| if x.is_nan() { a + 1 } else { a },
    )
}

/// Number of elements equal to zero.
pub(crate) fn zero_count<T: Kernels>(t: &Tensor<T>) -> usize {
    fold_runs(
        t,
        0usize,
        |a, xs| a + xs.iter().filter(|&&x| x == T::zero()).count(),
        |a, x| if x == T::zero() { a + 1 } else { a },
    )
}

fn arg_extreme<T: Kernels>(t: &Tensor<T>, order: Order, want_max: bool) -> Result<usize, OpsError> {
    require_nonempty(t, if want_max { "argmax" } else { "argmin" })?;
    let plan = t.loop_descriptor(order.auto_fc());
    let storage = t.storage();
    let mut best_pos = 0usize;
    let mut best: Option<T> = None;
    let mut i = 0usize;
    for &offset in &plan.offsets {
        let mut p = offset;
        for _ in 0..plan.bound {
            let value = storage.get(p);
            p += plan.step;
            let better = match best {
                None => true,
                // NaN comparisons are false, so NaN never replaces a value
                Some(b) => {
                    if want_max {
                        value > b
                    } else {
                        value < b
                    }
                }
            };
            if better {
                best = Some(value);
                best_pos = i;
            }
            i += 1;
        }
    }
    Ok(best_pos)
}

/// Position (in the given traversal order) of the maximum element.
pub(crate) fn argmax<T: Kernels>(t: &Tensor<T>, order: Order) -> Result<usize, OpsError> {
    arg_extreme(t, order, true)
}

/// Position (in the given traversal order) of the minimum element.
pub(crate) fn argmin<T: Kernels>(t: &Tensor<T>, order: Order) -> Result<usize, OpsError> {
    arg_extreme(t, order, false)
}

/// Per-axis reduction driver.
///
/// Builds the complement layout over every index except `axis`, then for
/// each complement index materializes the virtual 1-D view over `axis` and
/// applies `f`. The independent per-index computations are dispatched to the
/// worker pool in batches of [`REDUCE_BATCH`] and joined before returning.
///
/// `f` must be infallible: every precondition is validated here, before any
/// work is dispatched.
pub(crate) fn reduce1d<T, F>(t: &Tensor<T>, axis: usize, f: F) -> Result<Tensor<T>, OpsError>
where
    T: Kernels,
    F: Fn(&Tensor<T>) -> T + Sync,
{
    let (pairs, sel_dim, sel_stride, res) = reduce1d_setup(t, axis)?;
    let engine = t.engine().clone();
    let storage = t.storage();
    let res_ref = &res;
    engine.pool().scope(|scope| {
        for batch in pairs.chunks(REDUCE_BATCH) {
            let f = &f;
            let engine = &engine;
            scope.spawn(move |_| {
                for &(ptr, res_ptr) in batch {
                    let layout =
                        StrideLayout::of(Shape::of(&[sel_dim]), ptr, vec![sel_stride])
                            .expect("1-D slice layout is consistent");
                    let slice = engine
                        .stride(layout, storage.clone())
                        .expect("slice pointers stay inside the storage");
                    res_ref.storage().set(res_ptr, f(&slice));
                }
            });
        }
    });
    Ok(res)
}

type ReducePairs = Vec<(usize, usize)>;

fn reduce1d_setup<T: Kernels>(
    t: &Tensor<T>,
    axis: usize,
) -> Result<(ReducePairs, usize, usize, Tensor<T>), OpsError> {
    if axis >= t.rank() {
        return Err(OpsError::Tensor(
            ndarr_tensor::TensorError::axis_out_of_bounds(axis, t.rank()),
        ));
    }
    let new_dims = t.shape().narrow_dims(axis).map_err(OpsError::Tensor)?;
    let new_strides = t.layout().narrow_strides(axis).map_err(OpsError::Tensor)?;
    let sel_dim = t.dim(axis);
    let sel_stride = t.layout().stride(axis);

    let res = t
        .engine()
        .zeros::<T>(Shape::from(new_dims.clone()), Order::default_order());
    let complement = StrideLayout::of(
        Shape::from(new_dims),
        t.layout().offset(),
        new_strides,
    )
    .map_err(OpsError::Tensor)?;
    let pairs: ReducePairs = ndarr_tensor::PointerIterator::new(&complement, Order::C)
        .zip(res.ptr_iter(Order::C))
        .collect();
    log::debug!(
        "reduce1d axis {axis}: {} slices in batches of {REDUCE_BATCH}",
        pairs.len()
    );
    Ok((pairs, sel_dim, sel_stride, res))
}

/// Per-axis argmin/argmax driver returning positions as an `i32` tensor.
pub(crate) fn arg1d<T: Kernels>(
    t: &Tensor<T>,
    axis: usize,
    keepdim: bool,
    want_max: bool,
) -> Result<Tensor<i32>, OpsError> {
    if axis >= t.rank() {
        return Err(OpsError::Tensor(
            ndarr_tensor::TensorError::axis_out_of_bounds(axis, t.rank()),
        ));
    }
    if t.dim(axis) == 0 {
        return Err(OpsError::EmptyReduction(
            if want_max { "argmax" } else { "argmin" }.to_string(),
        ));
    }
    let (new_dims, new_strides) = if keepdim {
        let mut dims = t.shape().dims().to_vec();
        let mut strides = t.layout().strides().to_vec();
        dims[axis] = 1;
        strides[axis] = 0;
        (dims, strides)
    } else {
        (
            t.shape().narrow_dims(axis).map_err(OpsError::Tensor)?,
            t.layout().narrow_strides(axis).map_err(OpsError::Tensor)?,
        )
    };
    let sel_dim = t.dim(axis);
    let sel_stride = t.layout().stride(axis);

    let engine = t.engine().clone();
    let res = engine.zeros::<i32>(Shape::from(new_dims.clone()), Order::default_order());
    let complement = StrideLayout::of(
        Shape::from(new_dims),
        t.layout().offset(),
        new_strides,
    )
    .map_err(OpsError::Tensor)?;
    let pairs: ReducePairs = ndarr_tensor::PointerIterator::new(&complement, Order::C)
        .zip(res.ptr_iter(Order::C))
        .collect();

    let storage = t.storage();
    let res_ref = &res;
    engine.pool().scope(|scope| {
        for batch in pairs.chunks(REDUCE_BATCH) {
            let engine = &engine;
            scope.spawn(move |_| {
                for &(ptr, res_ptr) in batch {
                    let layout =
                        StrideLayout::of(Shape::of(&[sel_dim]), ptr, vec![sel_stride])
                            .expect("1-D slice layout is consistent");
                    let slice = engine
                        .stride(layout, storage.clone())
                        .expect("slice pointers stay inside the storage");
                    let pos = arg_extreme(&slice, Order::C, want_max)
                        .expect("slice is non-empty, validated before dispatch");
                    res_ref.storage().set(res_ptr, pos as i32);
                }
            });
        }
    });
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarr_tensor::Engine;

    fn engine() -> Engine {
        Engine::new().unwrap()
    }

    #[test]
    fn sum_and_mean_of_ramp() -> Result<(), OpsError> {
        let engine = engine();
        let n = 1000usize;
        let t = engine.seq::<f64>(Shape::of(&[n]), Order::C);
        assert_relative_eq!(sum(&t), (n * (n - 1) / 2) as f64);
        assert_relative_eq!(mean(&t)?, (n - 1) as f64 / 2.0);
        Ok(())
    }

    #[test]
    fn sum_on_strided_view() -> Result<(), OpsError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[4, 4]), Order::C);
        let col = t.select(1, 2).unwrap();
        assert_relative_eq!(sum(&col), 2.0 + 6.0 + 10.0 + 14.0);
        Ok(())
    }

    #[test]
    fn integer_sum_allowed_mean_rejected() {
        let engine = engine();
        let t = engine.seq::<i32>(Shape::of(&[5]), Order::C);
        assert_eq!(sum(&t), 10);
        assert!(matches!(
            mean(&t),
            Err(OpsError::UnsupportedDType { .. })
        ));
    }

    #[test]
    fn variance_three_pass_shape() -> Result<(), OpsError> {
        let engine = engine();
        let t = engine.from_vec(
            Shape::of(&[5]),
            Order::C,
            vec![1.0f64, 2.0, 3.0, 4.0, 5.0],
        )?;
        assert_relative_eq!(mean(&t)?, 3.0);
        assert_relative_eq!(var(&t, 0, None)?, 2.0);
        assert_relative_eq!(var(&t, 1, None)?, 2.5);

        let c = engine.full::<f64>(Shape::of(&[100]), Order::C, 7.25);
        assert_relative_eq!(var(&c, 0, None)?, 0.0);
        Ok(())
    }

    #[test]
    fn var_rejects_large_ddof() {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[3]), Order::C);
        assert!(var(&t, 3, None).is_err());
    }

    #[test]
    fn nan_family_excludes_nans() -> Result<(), OpsError> {
        let engine = engine();
        let mut data: Vec<f64> = (0..10).map(|i| i as f64).collect();
        data[2] = f64::NAN;
        data[7] = f64::NAN;
        let t = engine.from_vec(Shape::of(&[10]), Order::C, data)?;

        assert_eq!(nan_count(&t), 2);
        assert_relative_eq!(nan_sum(&t)?, 45.0 - 2.0 - 7.0);
        assert_relative_eq!(nan_mean(&t)?, 36.0 / 8.0);
        assert_relative_eq!(nan_min(&t)?, 0.0);
        assert_relative_eq!(nan_max(&t)?, 9.0);

        assert!(sum(&t).is_nan());
        assert!(min(&t)?.is_nan());
        Ok(())
    }

    #[test]
    fn min_max_and_counts() -> Result<(), OpsError> {
        let engine = engine();
        let t = engine.from_vec(Shape::of(&[5]), Order::C, vec![3.0f64, 0.0, -2.0, 8.0, 0.0])?;
        assert_relative_eq!(min(&t)?, -2.0);
        assert_relative_eq!(max(&t)?, 8.0);
        assert_eq!(zero_count(&t), 2);
        assert_eq!(argmax(&t, Order::C)?, 3);
        assert_eq!(argmin(&t, Order::C)?, 2);
        Ok(())
    }

    #[test]
    fn empty_reductions_error() {
        let engine = engine();
        let t = engine.zeros::<f64>(Shape::of(&[0]), Order::C);
        assert_eq!(sum(&t), 0.0);
        assert!(matches!(min(&t), Err(OpsError::EmptyReduction(_))));
        assert!(matches!(mean(&t), Err(OpsError::EmptyReduction(_))));
    }

    #[test]
    fn reduce1d_sums_rows_and_cols() -> Result<(), OpsError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[3, 4]), Order::C);
        let rows = reduce1d(&t, 1, |v| sum(v))?;
        assert_eq!(rows.shape().dims(), &[3]);
        assert_eq!(rows.to_vec(Order::C), vec![6.0, 22.0, 38.0]);
        let cols = reduce1d(&t, 0, |v| sum(v))?;
        assert_eq!(cols.to_vec(Order::C), vec![12.0, 15.0, 18.0, 21.0]);
        Ok(())
    }

    #[test]
    fn reduce1d_many_slices_crosses_batches() -> Result<(), OpsError> {
        // more than one dispatch batch of 128 slices
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[300, 2]), Order::C);
        let sums = reduce1d(&t, 1, |v| sum(v))?;
        assert_eq!(sums.shape().dims(), &[300]);
        for i in 0..300 {
            assert_relative_eq!(
                sums.get(&[i]).unwrap(),
                (4 * i + 1) as f64,
            );
        }
        Ok(())
    }

    #[test]
    fn arg1d_positions() -> Result<(), OpsError> {
        let engine = engine();
        let t = engine.from_vec(
            Shape::of(&[2, 3]),
            Order::C,
            vec![1.0f64, 9.0, 2.0, 7.0, 0.0, 5.0],
        )?;
        let am = arg1d(&t, 1, false, true)?;
        assert_eq!(am.to_vec(Order::C), vec![1, 0]);
        let am = arg1d(&t, 1, true, false)?;
        assert_eq!(am.shape().dims(), &[2, 1]);
        assert_eq!(am.to_vec(Order::C), vec![0, 1]);
        Ok(())
    }
}
