//! Unary operation table and execution.

use ndarr_tensor::{Element, Order, Tensor};

use crate::error::OpsError;
use crate::kernels::{Kernels, UnaryKind};

/// One entry of the unary operation table: a scalar function plus, for the
/// lane-batched operations, the kernel selector.
pub struct UnaryOp<T: Element> {
    pub(crate) name: &'static str,
    pub(crate) float_only: bool,
    pub(crate) scalar: fn(T) -> T,
    pub(crate) kind: Option<UnaryKind>,
}

impl<T: Element> UnaryOp<T> {
    /// Absolute value.
    pub fn abs() -> Self {
        UnaryOp {
            name: "abs",
            float_only: false,
            scalar: T::abs,
            kind: Some(UnaryKind::Abs),
        }
    }

    /// Arithmetic negation.
    pub fn neg() -> Self {
        UnaryOp {
            name: "neg",
            float_only: false,
            scalar: T::neg,
            kind: Some(UnaryKind::Neg),
        }
    }

    /// Elementwise square.
    pub fn sqr() -> Self {
        UnaryOp {
            name: "sqr",
            float_only: false,
            scalar: T::sqr,
            kind: Some(UnaryKind::Sqr),
        }
    }

    /// Square root.
    pub fn sqrt() -> Self {
        UnaryOp {
            name: "sqrt",
            float_only: true,
            scalar: T::sqrt,
            kind: Some(UnaryKind::Sqrt),
        }
    }

    /// Natural exponential.
    pub fn exp() -> Self {
        UnaryOp {
            name: "exp",
            float_only: true,
            scalar: T::exp,
            kind: None,
        }
    }

    /// `exp(x) - 1`.
    pub fn exp_m1() -> Self {
        UnaryOp {
            name: "exp_m1",
            float_only: true,
            scalar: T::exp_m1,
            kind: None,
        }
    }

    /// Natural logarithm.
    pub fn ln() -> Self {
        UnaryOp {
            name: "ln",
            float_only: true,
            scalar: T::ln,
            kind: None,
        }
    }

    /// `ln(1 + x)`.
    pub fn ln_1p() -> Self {
        UnaryOp {
            name: "ln_1p",
            float_only: true,
            scalar: T::ln_1p,
            kind: None,
        }
    }

    /// Sine.
    pub fn sin() -> Self {
        UnaryOp {
            name: "sin",
            float_only: true,
            scalar: T::sin,
            kind: None,
        }
    }

    /// Arcsine.
    pub fn asin() -> Self {
        UnaryOp {
            name: "asin",
            float_only: true,
            scalar: T::asin,
            kind: None,
        }
    }

    /// Hyperbolic sine.
    pub fn sinh() -> Self {
        UnaryOp {
            name: "sinh",
            float_only: true,
            scalar: T::sinh,
            kind: None,
        }
    }

    /// Cosine.
    pub fn cos() -> Self {
        UnaryOp {
            name: "cos",
            float_only: true,
            scalar: T::cos,
            kind: None,
        }
    }

    /// Arccosine.
    pub fn acos() -> Self {
        UnaryOp {
            name: "acos",
            float_only: true,
            scalar: T::acos,
            kind: None,
        }
    }

    /// Hyperbolic cosine.
    pub fn cosh() -> Self {
        UnaryOp {
            name: "cosh",
            float_only: true,
            scalar: T::cosh,
            kind: None,
        }
    }

    /// Tangent.
    pub fn tan() -> Self {
        UnaryOp {
            name: "tan",
            float_only: true,
            scalar: T::tan,
            kind: None,
        }
    }

    /// Arctangent.
    pub fn atan() -> Self {
        UnaryOp {
            name: "atan",
            float_only: true,
            scalar: T::atan,
            kind: None,
        }
    }

    /// Hyperbolic tangent.
    pub fn tanh() -> Self {
        UnaryOp {
            name: "tanh",
            float_only: true,
            scalar: T::tanh,
            kind: None,
        }
    }

    /// Rounds up.
    pub fn ceil() -> Self {
        UnaryOp {
            name: "ceil",
            float_only: true,
            scalar: T::ceil,
            kind: None,
        }
    }

    /// Rounds down.
    pub fn floor() -> Self {
        UnaryOp {
            name: "floor",
            float_only: true,
            scalar: T::floor,
            kind: None,
        }
    }

    /// Rounds to nearest, ties to even.
    pub fn rint() -> Self {
        UnaryOp {
            name: "rint",
            float_only: true,
            scalar: T::rint,
            kind: None,
        }
    }
}

/// Applies `op` in place over every element of `t`.
///
/// Unit-stride runs of SIMD-capable types go through the lane-batched kernel
/// when the operation has one; everything else walks scalar-wise.
pub(crate) fn apply_unary<T: Kernels>(t: &Tensor<T>, op: &UnaryOp<T>) -> Result<(), OpsError> {
    if op.float_only && !T::FLOATING {
        return Err(OpsError::unsupported_dtype(op.name, T::DTYPE));
    }
    let plan = t.loop_descriptor(Order::S);
    let storage = t.storage();
    for &offset in &plan.offsets {
        if plan.step == 1 && storage.supports_simd() {
            if let Some(kind) = op.kind {
                // SAFETY: in-place unary execution is single threaded and
                // runs of one descriptor are disjoint.
                let run = unsafe { storage.run_mut(offset, plan.bound) };
                T::unary_run(run, kind);
                continue;
            }
        }
        let mut p = offset;
        for _ in 0..plan.bound {
            storage.set(p, (op.scalar)(storage.get(p)));
            p += plan.step;
        }
    }
    Ok(())
}

/// Applies an arbitrary scalar function in place over every element.
pub(crate) fn apply_fn<T: Element>(t: &Tensor<T>, f: impl Fn(T) -> T) {
    let plan = t.loop_descriptor(Order::S);
    let storage = t.storage();
    for &offset in &plan.offsets {
        let mut p = offset;
        for _ in 0..plan.bound {
            storage.set(p, f(storage.get(p)));
            p += plan.step;
        }
    }
}

/// Replaces NaN elements with `v`, using masked lanes on unit-stride runs.
pub(crate) fn fill_nan<T: Kernels>(t: &Tensor<T>, v: T) -> Result<(), OpsError> {
    if !T::FLOATING {
        return Err(OpsError::unsupported_dtype("fill_nan", T::DTYPE));
    }
    let plan = t.loop_descriptor(Order::S);
    let storage = t.storage();
    for &offset in &plan.offsets {
        if plan.step == 1 && storage.supports_simd() {
            // SAFETY: single-threaded in-place pass, disjoint runs.
            let run = unsafe { storage.run_mut(offset, plan.bound) };
            T::fill_nan_run(run, v);
            continue;
        }
        let mut p = offset;
        for _ in 0..plan.bound {
            let x = storage.get(p);
            if x.is_nan() {
                storage.set(p, v);
            }
            p += plan.step;
        }
    }
    Ok(())
}
