use num_traits::{NumCast, One, Zero};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Identifier for the element types the engine can store and compute on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DType {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 32-bit integer.
    I32,
    /// 32-bit floating point.
    F32,
    /// 64-bit floating point.
    F64,
}

impl DType {
    /// Returns the element width in bytes.
    #[inline]
    pub fn byte_count(self) -> usize {
        match self {
            DType::U8 => 1,
            DType::I32 => 4,
            DType::F32 => 4,
            DType::F64 => 8,
        }
    }

    /// Returns true for floating point dtypes.
    #[inline]
    pub fn is_floating_point(self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }
}

/// Per-type operator table for tensor elements.
///
/// The generic engine is written once against this trait; each supported
/// element type contributes the small table of identities, combinators and
/// casts the kernels need. Floating-point-only entry points keep an identity
/// default for integral types: the execution layer rejects those operations
/// with an argument error before the table is ever consulted, so the
/// defaults are unreachable for integral dtypes.
///
/// `LANES` is the SIMD lane-width capability of the type: 1 means the type
/// is processed strictly scalar-wise; values above 1 let the kernels batch
/// unit-stride runs into whole-lane groups. Correctness never depends on the
/// lane width, only throughput.
pub trait Element:
    Copy
    + PartialEq
    + PartialOrd
    + std::fmt::Debug
    + std::fmt::Display
    + Send
    + Sync
    + Zero
    + One
    + NumCast
    + std::ops::Add<Output = Self>
    + std::ops::Sub<Output = Self>
    + std::ops::Mul<Output = Self>
    + std::ops::Div<Output = Self>
    + 'static
{
    /// The runtime dtype tag for this element type.
    const DTYPE: DType;
    /// True for floating point element types.
    const FLOATING: bool;
    /// SIMD lane-width capability; 1 means scalar-only.
    const LANES: usize;

    /// Casts from an f64, saturating at the type bounds.
    fn from_f64(v: f64) -> Self;
    /// Draws one value from the injected random source: standard normal for
    /// floating types, uniform over the full range for integral types.
    fn sample(rng: &mut rand::rngs::StdRng) -> Self;
    /// Widens to an f64.
    fn to_f64(self) -> f64;
    /// True if the value is a floating point NaN.
    #[inline]
    fn is_nan(self) -> bool {
        false
    }

    /// Elementwise minimum; propagates NaN for floating types.
    #[inline]
    fn minimum(self, other: Self) -> Self {
        if other.is_nan() || other < self {
            other
        } else {
            self
        }
    }

    /// Elementwise maximum; propagates NaN for floating types.
    #[inline]
    fn maximum(self, other: Self) -> Self {
        if other.is_nan() || other > self {
            other
        } else {
            self
        }
    }

    /// Absolute value.
    fn abs(self) -> Self;
    /// Arithmetic negation; wraps for integral types.
    fn neg(self) -> Self;
    /// The square `self * self`.
    #[inline]
    fn sqr(self) -> Self {
        self * self
    }
    /// Fused `self * a + b`, contracted to one rounding for floating types.
    #[inline]
    fn mul_add(self, a: Self, b: Self) -> Self {
        self * a + b
    }

    // Floating-point-only table. Integral types keep the identity defaults;
    // the float_only guard rejects them before dispatch.

    /// Natural exponential.
    #[inline]
    fn exp(self) -> Self {
        self
    }
    /// `exp(self) - 1` computed without cancellation.
    #[inline]
    fn exp_m1(self) -> Self {
        self
    }
    /// Natural logarithm.
    #[inline]
    fn ln(self) -> Self {
        self
    }
    /// `ln(1 + self)` computed without cancellation.
    #[inline]
    fn ln_1p(self) -> Self {
        self
    }
    /// Square root.
    #[inline]
    fn sqrt(self) -> Self {
        self
    }
    /// Sine.
    #[inline]
    fn sin(self) -> Self {
        self
    }
    /// Arcsine.
    #[inline]
    fn asin(self) -> Self {
        self
    }
    /// Hyperbolic sine.
    #[inline]
    fn sinh(self) -> Self {
        self
    }
    /// Cosine.
    #[inline]
    fn cos(self) -> Self {
        self
    }
    /// Arccosine.
    #[inline]
    fn acos(self) -> Self {
        self
    }
    /// Hyperbolic cosine.
    #[inline]
    fn cosh(self) -> Self {
        self
    }
    /// Tangent.
    #[inline]
    fn tan(self) -> Self {
        self
    }
    /// Arctangent.
    #[inline]
    fn atan(self) -> Self {
        self
    }
    /// Hyperbolic tangent.
    #[inline]
    fn tanh(self) -> Self {
        self
    }
    /// Rounds up to the nearest integer.
    #[inline]
    fn ceil(self) -> Self {
        self
    }
    /// Rounds down to the nearest integer.
    #[inline]
    fn floor(self) -> Self {
        self
    }
    /// Rounds to the nearest integer, ties to even.
    #[inline]
    fn rint(self) -> Self {
        self
    }
}

impl Element for u8 {
    const DTYPE: DType = DType::U8;
    const FLOATING: bool = false;
    const LANES: usize = 1;

    #[inline]
    fn from_f64(v: f64) -> u8 {
        v as u8
    }
    #[inline]
    fn sample(rng: &mut rand::rngs::StdRng) -> u8 {
        rng.random()
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
    #[inline]
    fn abs(self) -> u8 {
        self
    }
    #[inline]
    fn neg(self) -> u8 {
        self.wrapping_neg()
    }
}

impl Element for i32 {
    const DTYPE: DType = DType::I32;
    const FLOATING: bool = false;
    const LANES: usize = 1;

    #[inline]
    fn from_f64(v: f64) -> i32 {
        v as i32
    }
    #[inline]
    fn sample(rng: &mut rand::rngs::StdRng) -> i32 {
        rng.random()
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
    #[inline]
    fn abs(self) -> i32 {
        self.wrapping_abs()
    }
    #[inline]
    fn neg(self) -> i32 {
        self.wrapping_neg()
    }
}

impl Element for f32 {
    const DTYPE: DType = DType::F32;
    const FLOATING: bool = true;
    // wide::f32x8
    const LANES: usize = 8;

    #[inline]
    fn from_f64(v: f64) -> f32 {
        v as f32
    }
    #[inline]
    fn sample(rng: &mut rand::rngs::StdRng) -> f32 {
        StandardNormal.sample(rng)
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
    #[inline]
    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }
    #[inline]
    fn abs(self) -> f32 {
        f32::abs(self)
    }
    #[inline]
    fn neg(self) -> f32 {
        -self
    }
    #[inline]
    fn mul_add(self, a: f32, b: f32) -> f32 {
        f32::mul_add(self, a, b)
    }
    #[inline]
    fn exp(self) -> f32 {
        f32::exp(self)
    }
    #[inline]
    fn exp_m1(self) -> f32 {
        f32::exp_m1(self)
    }
    #[inline]
    fn ln(self) -> f32 {
        f32::ln(self)
    }
    #[inline]
    fn ln_1p(self) -> f32 {
        f32::ln_1p(self)
    }
    #[inline]
    fn sqrt(self) -> f32 {
        f32::sqrt(self)
    }
    #[inline]
    fn sin(self) -> f32 {
        f32::sin(self)
    }
    #[inline]
    fn asin(self) -> f32 {
        f32::asin(self)
    }
    #[inline]
    fn sinh(self) -> f32 {
        f32::sinh(self)
    }
    #[inline]
    fn cos(self) -> f32 {
        f32::cos(self)
    }
    #[inline]
    fn acos(self) -> f32 {
        f32::acos(self)
    }
    #[inline]
    fn cosh(self) -> f32 {
        f32::cosh(self)
    }
    #[inline]
    fn tan(self) -> f32 {
        f32::tan(self)
    }
    #[inline]
    fn atan(self) -> f32 {
        f32::atan(self)
    }
    #[inline]
    fn tanh(self) -> f32 {
        f32::tanh(self)
    }
    #[inline]
    fn ceil(self) -> f32 {
        f32::ceil(self)
    }
    #[inline]
    fn floor(self) -> f32 {
        f32::floor(self)
    }
    #[inline]
    fn rint(self) -> f32 {
        // ties-to-even, matching the hardware rounding mode
        let r = f32::round(self);
        if (self - self.trunc()).abs() == 0.5 && r % 2.0 != 0.0 {
            r - self.signum()
        } else {
            r
        }
    }
}

impl Element for f64 {
    const DTYPE: DType = DType::F64;
    const FLOATING: bool = true;
    // wide::f64x4
    const LANES: usize = 4;

    #[inline]
    fn from_f64(v: f64) -> f64 {
        v
    }
    #[inline]
    fn sample(rng: &mut rand::rngs::StdRng) -> f64 {
        StandardNormal.sample(rng)
    }
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
    #[inline]
    fn is_nan(self) -> bool {
        f64::is_nan(self)
    }
    #[inline]
    fn abs(self) -> f64 {
        f64::abs(self)
    }
    #[inline]
    fn neg(self) -> f64 {
        -self
    }
    #[inline]
    fn mul_add(self, a: f64, b: f64) -> f64 {
        f64::mul_add(self, a, b)
    }
    #[inline]
    fn exp(self) -> f64 {
        f64::exp(self)
    }
    #[inline]
    fn exp_m1(self) -> f64 {
        f64::exp_m1(self)
    }
    #[inline]
    fn ln(self) -> f64 {
        f64::ln(self)
    }
    #[inline]
    fn ln_1p(self) -> f64 {
        f64::ln_1p(self)
    }
    #[inline]
    fn sqrt(self) -> f64 {
        f64::sqrt(self)
    }
    #[inline]
    fn sin(self) -> f64 {
        f64::sin(self)
    }
    #[inline]
    fn asin(self) -> f64 {
        f64::asin(self)
    }
    #[inline]
    fn sinh(self) -> f64 {
        f64::sinh(self)
    }
    #[inline]
    fn cos(self) -> f64 {
        f64::cos(self)
    }
    #[inline]
    fn acos(self) -> f64 {
        f64::acos(self)
    }
    #[inline]
    fn cosh(self) -> f64 {
        f64::cosh(self)
    }
    #[inline]
    fn tan(self) -> f64 {
        f64::tan(self)
    }
    #[inline]
    fn atan(self) -> f64 {
        f64::atan(self)
    }
    #[inline]
    fn tanh(self) -> f64 {
        f64::tanh(self)
    }
    #[inline]
    fn ceil(self) -> f64 {
        f64::ceil(self)
    }
    #[inline]
    fn floor(self) -> f64 {
        f64::floor(self)
    }
    #[inline]
    fn rint(self) -> f64 {
        let r = f64::round(self);
        if (self - self.trunc()).abs() == 0.5 && r % 2.0 != 0.0 {
            r - self.signum()
        } else {
            r
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dtype_properties() {
        assert_eq!(DType::U8.byte_count(), 1);
        assert_eq!(DType::F64.byte_count(), 8);
        assert!(DType::F32.is_floating_point());
        assert!(!DType::I32.is_floating_point());
    }

    #[test]
    fn minimum_maximum_nan() {
        assert_eq!(Element::minimum(2.0f64, 3.0), 2.0);
        assert_eq!(Element::maximum(2.0f64, 3.0), 3.0);
        assert!(Element::minimum(2.0f64, f64::NAN).is_nan());
        assert!(Element::maximum(2.0f64, f64::NAN).is_nan());
    }

    #[test]
    fn integral_wrapping() {
        assert_eq!(Element::neg(1u8), 255);
        assert_eq!(Element::abs(-3i32), 3);
        assert_eq!(Element::neg(i32::MIN), i32::MIN);
    }

    #[test]
    fn rint_ties_to_even() {
        assert_eq!(Element::rint(0.5f64), 0.0);
        assert_eq!(Element::rint(1.5f64), 2.0);
        assert_eq!(Element::rint(2.5f64), 2.0);
        assert_eq!(Element::rint(-0.5f64), 0.0);
        assert_eq!(Element::rint(2.3f64), 2.0);
    }
}
