//! The numeric operation surface of a tensor.
//!
//! [`TensorOps`] glues the execution modules onto [`Tensor`]. Following the
//! source conventions of the engine, methods ending in `_` mutate the tensor
//! in place (and through it every view aliasing the same storage); their
//! underscore-free counterparts materialize a dense copy first and leave the
//! receiver untouched.

use ndarr_tensor::{Order, Tensor};

use crate::binary;
use crate::error::OpsError;
use crate::kernels::{BinaryKind, Kernels};
use crate::linalg;
use crate::reduce;
use crate::unary::{self, UnaryOp};

/// Elementwise, reduction and linear-algebra operations on tensors.
pub trait TensorOps<T: Kernels>: Sized {
    // ---- unary -----------------------------------------------------------

    /// Absolute value, in place.
    fn abs_(&mut self) -> Result<(), OpsError>;
    /// Absolute value into a new tensor.
    fn abs(&self) -> Result<Tensor<T>, OpsError>;
    /// Negation, in place.
    fn neg_(&mut self) -> Result<(), OpsError>;
    /// Negation into a new tensor.
    fn neg(&self) -> Result<Tensor<T>, OpsError>;
    /// Elementwise square, in place.
    fn sqr_(&mut self) -> Result<(), OpsError>;
    /// Elementwise square into a new tensor.
    fn sqr(&self) -> Result<Tensor<T>, OpsError>;
    /// Square root, in place. Floating dtypes only.
    fn sqrt_(&mut self) -> Result<(), OpsError>;
    /// Square root into a new tensor. Floating dtypes only.
    fn sqrt(&self) -> Result<Tensor<T>, OpsError>;
    /// Natural exponential, in place. Floating dtypes only.
    fn exp_(&mut self) -> Result<(), OpsError>;
    /// Natural exponential into a new tensor. Floating dtypes only.
    fn exp(&self) -> Result<Tensor<T>, OpsError>;
    /// `exp(x) - 1`, in place. Floating dtypes only.
    fn exp_m1_(&mut self) -> Result<(), OpsError>;
    /// `exp(x) - 1` into a new tensor. Floating dtypes only.
    fn exp_m1(&self) -> Result<Tensor<T>, OpsError>;
    /// Natural logarithm, in place. Floating dtypes only.
    fn ln_(&mut self) -> Result<(), OpsError>;
    /// Natural logarithm into a new tensor. Floating dtypes only.
    fn ln(&self) -> Result<Tensor<T>, OpsError>;
    /// `ln(1 + x)`, in place. Floating dtypes only.
    fn ln_1p_(&mut self) -> Result<(), OpsError>;
    /// `ln(1 + x)` into a new tensor. Floating dtypes only.
    fn ln_1p(&self) -> Result<Tensor<T>, OpsError>;
    /// Sine, in place. Floating dtypes only.
    fn sin_(&mut self) -> Result<(), OpsError>;
    /// Sine into a new tensor. Floating dtypes only.
    fn sin(&self) -> Result<Tensor<T>, OpsError>;
    /// Arcsine, in place. Floating dtypes only.
    fn asin_(&mut self) -> Result<(), OpsError>;
    /// Arcsine into a new tensor. Floating dtypes only.
    fn asin(&self) -> Result<Tensor<T>, OpsError>;
    /// Hyperbolic sine, in place. Floating dtypes only.
    fn sinh_(&mut self) -> Result<(), OpsError>;
    /// Hyperbolic sine into a new tensor. Floating dtypes only.
    fn sinh(&self) -> Result<Tensor<T>, OpsError>;
    /// Cosine, in place. Floating dtypes only.
    fn cos_(&mut self) -> Result<(), OpsError>;
    /// Cosine into a new tensor. Floating dtypes only.
    fn cos(&self) -> Result<Tensor<T>, OpsError>;
    /// Arccosine, in place. Floating dtypes only.
    fn acos_(&mut self) -> Result<(), OpsError>;
    /// Arccosine into a new tensor. Floating dtypes only.
    fn acos(&self) -> Result<Tensor<T>, OpsError>;
    /// Hyperbolic cosine, in place. Floating dtypes only.
    fn cosh_(&mut self) -> Result<(), OpsError>;
    /// Hyperbolic cosine into a new tensor. Floating dtypes only.
    fn cosh(&self) -> Result<Tensor<T>, OpsError>;
    /// Tangent, in place. Floating dtypes only.
    fn tan_(&mut self) -> Result<(), OpsError>;
    /// Tangent into a new tensor. Floating dtypes only.
    fn tan(&self) -> Result<Tensor<T>, OpsError>;
    /// Arctangent, in place. Floating dtypes only.
    fn atan_(&mut self) -> Result<(), OpsError>;
    /// Arctangent into a new tensor. Floating dtypes only.
    fn atan(&self) -> Result<Tensor<T>, OpsError>;
    /// Hyperbolic tangent, in place. Floating dtypes only.
    fn tanh_(&mut self) -> Result<(), OpsError>;
    /// Hyperbolic tangent into a new tensor. Floating dtypes only.
    fn tanh(&self) -> Result<Tensor<T>, OpsError>;
    /// Rounds up, in place. Floating dtypes only.
    fn ceil_(&mut self) -> Result<(), OpsError>;
    /// Rounds up into a new tensor. Floating dtypes only.
    fn ceil(&self) -> Result<Tensor<T>, OpsError>;
    /// Rounds down, in place. Floating dtypes only.
    fn floor_(&mut self) -> Result<(), OpsError>;
    /// Rounds down into a new tensor. Floating dtypes only.
    fn floor(&self) -> Result<Tensor<T>, OpsError>;
    /// Rounds to nearest (ties to even), in place. Floating dtypes only.
    fn rint_(&mut self) -> Result<(), OpsError>;
    /// Rounds to nearest (ties to even) into a new tensor. Floating only.
    fn rint(&self) -> Result<Tensor<T>, OpsError>;

    /// Clamps every element to `[lo, hi]`, in place.
    fn clamp_(&mut self, lo: T, hi: T) -> Result<(), OpsError>;
    /// Fills every element with `v`, in place.
    fn fill_(&mut self, v: T);
    /// Replaces NaN elements with `v`, in place. Floating dtypes only.
    fn fill_nan_(&mut self, v: T) -> Result<(), OpsError>;
    /// Replaces NaN elements with `v` into a new tensor. Floating only.
    fn fill_nan(&self, v: T) -> Result<Tensor<T>, OpsError>;
    /// Applies an arbitrary scalar function to every element, in place.
    fn apply_(&mut self, f: impl Fn(T) -> T);

    // ---- binary ----------------------------------------------------------

    /// Elementwise addition, in place; `other` may broadcast.
    fn add_(&mut self, other: &Tensor<T>) -> Result<(), OpsError>;
    /// Elementwise addition into a new tensor.
    fn add(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError>;
    /// Elementwise subtraction, in place; `other` may broadcast.
    fn sub_(&mut self, other: &Tensor<T>) -> Result<(), OpsError>;
    /// Elementwise subtraction into a new tensor.
    fn sub(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError>;
    /// Elementwise multiplication, in place; `other` may broadcast.
    fn mul_(&mut self, other: &Tensor<T>) -> Result<(), OpsError>;
    /// Elementwise multiplication into a new tensor.
    fn mul(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError>;
    /// Elementwise division, in place; `other` may broadcast.
    fn div_(&mut self, other: &Tensor<T>) -> Result<(), OpsError>;
    /// Elementwise division into a new tensor.
    fn div(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError>;
    /// Elementwise minimum, in place; `other` may broadcast.
    fn minimum_(&mut self, other: &Tensor<T>) -> Result<(), OpsError>;
    /// Elementwise minimum into a new tensor.
    fn minimum(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError>;
    /// Elementwise maximum, in place; `other` may broadcast.
    fn maximum_(&mut self, other: &Tensor<T>) -> Result<(), OpsError>;
    /// Elementwise maximum into a new tensor.
    fn maximum(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError>;

    /// Adds the scalar `v` to every element, in place.
    fn add_scalar_(&mut self, v: T) -> Result<(), OpsError>;
    /// Adds the scalar `v` into a new tensor.
    fn add_scalar(&self, v: T) -> Result<Tensor<T>, OpsError>;
    /// Subtracts the scalar `v` from every element, in place.
    fn sub_scalar_(&mut self, v: T) -> Result<(), OpsError>;
    /// Subtracts the scalar `v` into a new tensor.
    fn sub_scalar(&self, v: T) -> Result<Tensor<T>, OpsError>;
    /// Multiplies every element by the scalar `v`, in place.
    fn mul_scalar_(&mut self, v: T) -> Result<(), OpsError>;
    /// Multiplies by the scalar `v` into a new tensor.
    fn mul_scalar(&self, v: T) -> Result<Tensor<T>, OpsError>;
    /// Divides every element by the scalar `v`, in place.
    fn div_scalar_(&mut self, v: T) -> Result<(), OpsError>;
    /// Divides by the scalar `v` into a new tensor.
    fn div_scalar(&self, v: T) -> Result<Tensor<T>, OpsError>;

    /// Fused multiply-add, in place: `self[i] += a * other[i]`.
    fn fma_(&mut self, a: T, other: &Tensor<T>) -> Result<(), OpsError>;

    // ---- reductions ------------------------------------------------------

    /// Sum of all elements; 0 for an empty tensor.
    fn sum(&self) -> T;
    /// Sum excluding NaN elements. Floating dtypes only.
    fn nan_sum(&self) -> Result<T, OpsError>;
    /// Product of all elements; 1 for an empty tensor.
    fn prod(&self) -> T;
    /// Product excluding NaN elements. Floating dtypes only.
    fn nan_prod(&self) -> Result<T, OpsError>;
    /// Minimum element; NaN propagates for floating dtypes.
    fn min(&self) -> Result<T, OpsError>;
    /// Maximum element; NaN propagates for floating dtypes.
    fn max(&self) -> Result<T, OpsError>;
    /// Minimum excluding NaN elements. Floating dtypes only.
    fn nan_min(&self) -> Result<T, OpsError>;
    /// Maximum excluding NaN elements. Floating dtypes only.
    fn nan_max(&self) -> Result<T, OpsError>;
    /// Compensated three-pass mean. Floating dtypes only.
    fn mean(&self) -> Result<T, OpsError>;
    /// Compensated mean excluding NaN elements. Floating dtypes only.
    fn nan_mean(&self) -> Result<T, OpsError>;
    /// Variance with `ddof` delta degrees of freedom. Floating only.
    fn var(&self, ddof: usize) -> Result<T, OpsError>;
    /// Variance around a precomputed mean. Floating dtypes only.
    fn var_with_mean(&self, ddof: usize, mean: T) -> Result<T, OpsError>;
    /// Standard deviation with `ddof` delta degrees of freedom.
    fn std(&self, ddof: usize) -> Result<T, OpsError>;
    /// Number of NaN elements; always 0 for integral dtypes.
    fn nan_count(&self) -> usize;
    /// Number of elements equal to zero.
    fn zero_count(&self) -> usize;
    /// Position of the minimum element in the given traversal order.
    fn argmin(&self, order: Order) -> Result<usize, OpsError>;
    /// Position of the maximum element in the given traversal order.
    fn argmax(&self, order: Order) -> Result<usize, OpsError>;

    /// Per-axis sum: reduces `axis` away.
    fn sum1d(&self, axis: usize) -> Result<Tensor<T>, OpsError>;
    /// Per-axis sum excluding NaN elements. Floating dtypes only.
    fn nan_sum1d(&self, axis: usize) -> Result<Tensor<T>, OpsError>;
    /// Per-axis product.
    fn prod1d(&self, axis: usize) -> Result<Tensor<T>, OpsError>;
    /// Per-axis minimum; the axis must be non-empty.
    fn min1d(&self, axis: usize) -> Result<Tensor<T>, OpsError>;
    /// Per-axis maximum; the axis must be non-empty.
    fn max1d(&self, axis: usize) -> Result<Tensor<T>, OpsError>;
    /// Per-axis compensated mean. Floating dtypes only.
    fn mean1d(&self, axis: usize) -> Result<Tensor<T>, OpsError>;
    /// Per-axis compensated mean excluding NaNs. Floating dtypes only.
    fn nan_mean1d(&self, axis: usize) -> Result<Tensor<T>, OpsError>;
    /// Per-axis variance with `ddof` delta degrees of freedom.
    fn var1d(&self, axis: usize, ddof: usize) -> Result<Tensor<T>, OpsError>;
    /// Per-axis argmin as an `i32` tensor.
    fn argmin1d(&self, axis: usize, keepdim: bool) -> Result<Tensor<i32>, OpsError>;
    /// Per-axis argmax as an `i32` tensor.
    fn argmax1d(&self, axis: usize, keepdim: bool) -> Result<Tensor<i32>, OpsError>;

    // ---- linear algebra --------------------------------------------------

    /// Dot product with another vector.
    fn inner(&self, other: &Tensor<T>) -> Result<T, OpsError>;
    /// Dot product over the index range `[start, end)`.
    fn inner_range(&self, other: &Tensor<T>, start: usize, end: usize) -> Result<T, OpsError>;
    /// Matrix-vector product.
    fn mv(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError>;
    /// Vector-transpose-matrix product.
    fn vtm(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError>;
    /// Batched matrix-vector product with rank normalization.
    fn bmv(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError>;
    /// Batched vector-transpose-matrix product with rank normalization.
    fn bvtm(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError>;
    /// Blocked, parallel dense matrix product.
    fn mm(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError>;
    /// Batched matrix product with rank normalization.
    fn bmm(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError>;
    /// Sum of the main diagonal of a square matrix.
    fn trace(&self) -> Result<T, OpsError>;
}

macro_rules! unary_pair {
    ($self:expr, $ctor:ident) => {{
        unary::apply_unary($self, &UnaryOp::$ctor())
    }};
}

fn copied<T: Kernels>(t: &Tensor<T>) -> Tensor<T> {
    t.copy(Order::A)
}

impl<T: Kernels> TensorOps<T> for Tensor<T> {
    fn abs_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, abs)
    }
    fn abs(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.abs_()?;
        Ok(c)
    }
    fn neg_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, neg)
    }
    fn neg(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.neg_()?;
        Ok(c)
    }
    fn sqr_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, sqr)
    }
    fn sqr(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.sqr_()?;
        Ok(c)
    }
    fn sqrt_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, sqrt)
    }
    fn sqrt(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.sqrt_()?;
        Ok(c)
    }
    fn exp_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, exp)
    }
    fn exp(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.exp_()?;
        Ok(c)
    }
    fn exp_m1_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, exp_m1)
    }
    fn exp_m1(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.exp_m1_()?;
        Ok(c)
    }
    fn ln_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, ln)
    }
    fn ln(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.ln_()?;
        Ok(c)
    }
    fn ln_1p_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, ln_1p)
    }
    fn ln_1p(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.ln_1p_()?;
        Ok(c)
    }
    fn sin_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, sin)
    }
    fn sin(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.sin_()?;
        Ok(c)
    }
    fn asin_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, asin)
    }
    fn asin(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.asin_()?;
        Ok(c)
    }
    fn sinh_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, sinh)
    }
    fn sinh(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.sinh_()?;
        Ok(c)
    }
    fn cos_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, cos)
    }
    fn cos(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.cos_()?;
        Ok(c)
    }
    fn acos_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, acos)
    }
    fn acos(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.acos_()?;
        Ok(c)
    }
    fn cosh_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, cosh)
    }
    fn cosh(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.cosh_()?;
        Ok(c)
    }
    fn tan_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, tan)
    }
    fn tan(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.tan_()?;
        Ok(c)
    }
    fn atan_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, atan)
    }
    fn atan(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.atan_()?;
        Ok(c)
    }
    fn tanh_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, tanh)
    }
    fn tanh(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.tanh_()?;
        Ok(c)
    }
    fn ceil_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, ceil)
    }
    fn ceil(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.ceil_()?;
        Ok(c)
    }
    fn floor_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, floor)
    }
    fn floor(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.floor_()?;
        Ok(c)
    }
    fn rint_(&mut self) -> Result<(), OpsError> {
        unary_pair!(self, rint)
    }
    fn rint(&self) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.rint_()?;
        Ok(c)
    }

    fn clamp_(&mut self, lo: T, hi: T) -> Result<(), OpsError> {
        if lo > hi {
            return Err(OpsError::invalid_argument(format!(
                "Clamp bounds are inverted: {lo} > {hi}."
            )));
        }
        unary::apply_fn(self, |x| x.maximum(lo).minimum(hi));
        Ok(())
    }
    fn fill_(&mut self, v: T) {
        unary::apply_fn(self, |_| v);
    }
    fn fill_nan_(&mut self, v: T) -> Result<(), OpsError> {
        unary::fill_nan(self, v)
    }
    fn fill_nan(&self, v: T) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.fill_nan_(v)?;
        Ok(c)
    }
    fn apply_(&mut self, f: impl Fn(T) -> T) {
        unary::apply_fn(self, f);
    }

    fn add_(&mut self, other: &Tensor<T>) -> Result<(), OpsError> {
        binary::apply_binary(self, other, BinaryKind::Add)
    }
    fn add(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.add_(other)?;
        Ok(c)
    }
    fn sub_(&mut self, other: &Tensor<T>) -> Result<(), OpsError> {
        binary::apply_binary(self, other, BinaryKind::Sub)
    }
    fn sub(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.sub_(other)?;
        Ok(c)
    }
    fn mul_(&mut self, other: &Tensor<T>) -> Result<(), OpsError> {
        binary::apply_binary(self, other, BinaryKind::Mul)
    }
    fn mul(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.mul_(other)?;
        Ok(c)
    }
    fn div_(&mut self, other: &Tensor<T>) -> Result<(), OpsError> {
        binary::apply_binary(self, other, BinaryKind::Div)
    }
    fn div(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.div_(other)?;
        Ok(c)
    }
    fn minimum_(&mut self, other: &Tensor<T>) -> Result<(), OpsError> {
        binary::apply_binary(self, other, BinaryKind::Min)
    }
    fn minimum(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.minimum_(other)?;
        Ok(c)
    }
    fn maximum_(&mut self, other: &Tensor<T>) -> Result<(), OpsError> {
        binary::apply_binary(self, other, BinaryKind::Max)
    }
    fn maximum(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.maximum_(other)?;
        Ok(c)
    }

    fn add_scalar_(&mut self, v: T) -> Result<(), OpsError> {
        binary::apply_binary_scalar(self, v, BinaryKind::Add)
    }
    fn add_scalar(&self, v: T) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.add_scalar_(v)?;
        Ok(c)
    }
    fn sub_scalar_(&mut self, v: T) -> Result<(), OpsError> {
        binary::apply_binary_scalar(self, v, BinaryKind::Sub)
    }
    fn sub_scalar(&self, v: T) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.sub_scalar_(v)?;
        Ok(c)
    }
    fn mul_scalar_(&mut self, v: T) -> Result<(), OpsError> {
        binary::apply_binary_scalar(self, v, BinaryKind::Mul)
    }
    fn mul_scalar(&self, v: T) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.mul_scalar_(v)?;
        Ok(c)
    }
    fn div_scalar_(&mut self, v: T) -> Result<(), OpsError> {
        binary::apply_binary_scalar(self, v, BinaryKind::Div)
    }
    fn div_scalar(&self, v: T) -> Result<Tensor<T>, OpsError> {
        let mut c = copied(self);
        c.div_scalar_(v)?;
        Ok(c)
    }

    fn fma_(&mut self, a: T, other: &Tensor<T>) -> Result<(), OpsError> {
        binary::apply_fma(self, a, other)
    }

    fn sum(&self) -> T {
        reduce::sum(self)
    }
    fn nan_sum(&self) -> Result<T, OpsError> {
        reduce::nan_sum(self)
    }
    fn prod(&self) -> T {
        reduce::prod(self)
    }
    fn nan_prod(&self) -> Result<T, OpsError> {
        reduce::nan_prod(self)
    }
    fn min(&self) -> Result<T, OpsError> {
        reduce::min(self)
    }
    fn max(&self) -> Result<T, OpsError> {
        reduce::max(self)
    }
    fn nan_min(&self) -> Result<T, OpsError> {
        reduce::nan_min(self)
    }
    fn nan_max(&self) -> Result<T, OpsError> {
        reduce::nan_max(self)
    }
    fn mean(&self) -> Result<T, OpsError> {
        reduce::mean(self)
    }
    fn nan_mean(&self) -> Result<T, OpsError> {
        reduce::nan_mean(self)
    }
    fn var(&self, ddof: usize) -> Result<T, OpsError> {
        reduce::var(self, ddof, None)
    }
    fn var_with_mean(&self, ddof: usize, mean: T) -> Result<T, OpsError> {
        reduce::var(self, ddof, Some(mean))
    }
    fn std(&self, ddof: usize) -> Result<T, OpsError> {
        reduce::std(self, ddof)
    }
    fn nan_count(&self) -> usize {
        reduce::nan_count(self)
    }
    fn zero_count(&self) -> usize {
        reduce::zero_count(self)
    }
    fn argmin(&self, order: Order) -> Result<usize, OpsError> {
        reduce::argmin(self, order)
    }
    fn argmax(&self, order: Order) -> Result<usize, OpsError> {
        reduce::argmax(self, order)
    }

    fn sum1d(&self, axis: usize) -> Result<Tensor<T>, OpsError> {
        reduce::reduce1d(self, axis, |v| reduce::sum(v))
    }
    fn nan_sum1d(&self, axis: usize) -> Result<Tensor<T>, OpsError> {
        if !T::FLOATING {
            return Err(OpsError::unsupported_dtype("nan_sum1d", T::DTYPE));
        }
        reduce::reduce1d(self, axis, |v| {
            reduce::nan_sum(v).expect("dtype validated before dispatch")
        })
    }
    fn prod1d(&self, axis: usize) -> Result<Tensor<T>, OpsError> {
        reduce::reduce1d(self, axis, |v| reduce::prod(v))
    }
    fn min1d(&self, axis: usize) -> Result<Tensor<T>, OpsError> {
        if axis < self.rank() && self.dim(axis) == 0 {
            return Err(OpsError::EmptyReduction("min1d".to_string()));
        }
        reduce::reduce1d(self, axis, |v| {
            reduce::min(v).expect("axis validated non-empty before dispatch")
        })
    }
    fn max1d(&self, axis: usize) -> Result<Tensor<T>, OpsError> {
        if axis < self.rank() && self.dim(axis) == 0 {
            return Err(OpsError::EmptyReduction("max1d".to_string()));
        }
        reduce::reduce1d(self, axis, |v| {
            reduce::max(v).expect("axis validated non-empty before dispatch")
        })
    }
    fn mean1d(&self, axis: usize) -> Result<Tensor<T>, OpsError> {
        if !T::FLOATING {
            return Err(OpsError::unsupported_dtype("mean1d", T::DTYPE));
        }
        if axis < self.rank() && self.dim(axis) == 0 {
            return Err(OpsError::EmptyReduction("mean1d".to_string()));
        }
        reduce::reduce1d(self, axis, |v| {
            reduce::mean(v).expect("preconditions validated before dispatch")
        })
    }
    fn nan_mean1d(&self, axis: usize) -> Result<Tensor<T>, OpsError> {
        if !T::FLOATING {
            return Err(OpsError::unsupported_dtype("nan_mean1d", T::DTYPE));
        }
        if axis < self.rank() && self.dim(axis) == 0 {
            return Err(OpsError::EmptyReduction("nan_mean1d".to_string()));
        }
        reduce::reduce1d(self, axis, |v| {
            reduce::nan_mean(v).expect("preconditions validated before dispatch")
        })
    }
    fn var1d(&self, axis: usize, ddof: usize) -> Result<Tensor<T>, OpsError> {
        if !T::FLOATING {
            return Err(OpsError::unsupported_dtype("var1d", T::DTYPE));
        }
        if axis < self.rank() && ddof >= self.dim(axis) {
            return Err(OpsError::invalid_argument(format!(
                "ddof {ddof} must be smaller than the axis size {}.",
                self.dim(axis)
            )));
        }
        reduce::reduce1d(self, axis, move |v| {
            reduce::var(v, ddof, None).expect("preconditions validated before dispatch")
        })
    }
    fn argmin1d(&self, axis: usize, keepdim: bool) -> Result<Tensor<i32>, OpsError> {
        reduce::arg1d(self, axis, keepdim, false)
    }
    fn argmax1d(&self, axis: usize, keepdim: bool) -> Result<Tensor<i32>, OpsError> {
        reduce::arg1d(self, axis, keepdim, true)
    }

    fn inner(&self, other: &Tensor<T>) -> Result<T, OpsError> {
        linalg::inner(self, other)
    }
    fn inner_range(&self, other: &Tensor<T>, start: usize, end: usize) -> Result<T, OpsError> {
        linalg::inner_range(self, other, start, end)
    }
    fn mv(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
        linalg::mv(self, other)
    }
    fn vtm(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
        linalg::vtm(self, other)
    }
    fn bmv(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
        linalg::bmv(self, other)
    }
    fn bvtm(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
        linalg::bvtm(self, other)
    }
    fn mm(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
        linalg::mm(self, other)
    }
    fn bmm(&self, other: &Tensor<T>) -> Result<Tensor<T>, OpsError> {
        linalg::bmm(self, other)
    }
    fn trace(&self) -> Result<T, OpsError> {
        linalg::trace(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarr_tensor::{Engine, Shape};

    fn engine() -> Engine {
        Engine::new().unwrap()
    }

    #[test]
    fn out_of_place_leaves_receiver_untouched() -> Result<(), OpsError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[4]), Order::C);
        let n = t.neg()?;
        assert_eq!(t.to_vec(Order::C), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(n.to_vec(Order::C), vec![0.0, -1.0, -2.0, -3.0]);
        Ok(())
    }

    #[test]
    fn clamp_and_fill() -> Result<(), OpsError> {
        let engine = engine();
        let mut t = engine.seq::<f64>(Shape::of(&[6]), Order::C);
        t.clamp_(1.0, 4.0)?;
        assert_eq!(t.to_vec(Order::C), vec![1.0, 1.0, 2.0, 3.0, 4.0, 4.0]);
        assert!(t.clamp_(4.0, 1.0).is_err());
        t.fill_(7.0);
        assert_eq!(t.sum(), 42.0);
        Ok(())
    }

    #[test]
    fn scalar_ops_chain() -> Result<(), OpsError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[5]), Order::C);
        let r = t.mul_scalar(2.0)?.add_scalar(1.0)?;
        assert_eq!(r.to_vec(Order::C), vec![1.0, 3.0, 5.0, 7.0, 9.0]);
        Ok(())
    }

    #[test]
    fn apply_arbitrary_function() {
        let engine = engine();
        let mut t = engine.seq::<i32>(Shape::of(&[4]), Order::C);
        t.apply_(|x| x * x + 1);
        assert_eq!(t.to_vec(Order::C), vec![1, 2, 5, 10]);
    }

    #[test]
    fn mean_and_var_through_trait() -> Result<(), OpsError> {
        let engine = engine();
        let t = engine.from_vec(
            Shape::of(&[5]),
            Order::C,
            vec![1.0f64, 2.0, 3.0, 4.0, 5.0],
        )?;
        assert_relative_eq!(t.mean()?, 3.0);
        assert_relative_eq!(t.var(0)?, 2.0);
        assert_relative_eq!(t.var_with_mean(1, 3.0)?, 2.5);
        assert_relative_eq!(t.std(0)?, 2.0f64.sqrt());
        Ok(())
    }

    #[test]
    fn axis_reductions_through_trait() -> Result<(), OpsError> {
        let engine = engine();
        let t = engine.seq::<f64>(Shape::of(&[2, 3]), Order::C);
        assert_eq!(t.sum1d(0)?.to_vec(Order::C), vec![3.0, 5.0, 7.0]);
        assert_eq!(t.mean1d(1)?.to_vec(Order::C), vec![1.0, 4.0]);
        assert_eq!(t.max1d(1)?.to_vec(Order::C), vec![2.0, 5.0]);
        assert!(engine
            .seq::<i32>(Shape::of(&[2, 2]), Order::C)
            .mean1d(0)
            .is_err());
        Ok(())
    }

    #[test]
    fn var1d_matches_whole_tensor_var() -> Result<(), OpsError> {
        let engine = engine();
        let t = engine.from_vec(
            Shape::of(&[1, 5]),
            Order::C,
            vec![1.0f64, 2.0, 3.0, 4.0, 5.0],
        )?;
        let v = t.var1d(1, 1)?;
        assert_relative_eq!(v.get(&[0]).unwrap(), 2.5);
        Ok(())
    }
}
