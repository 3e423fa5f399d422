// num_traits integration, so generic `Float` code runs on dual numbers unchanged.

use super::Fwd;
use crate::rules;
use crate::traits::Scalar;
use num_traits::{Float, FromPrimitive, Num, NumCast, One, ParseFloatError, ToPrimitive, Zero};
use std::num::FpCategory;

impl<V: Scalar> Zero for Fwd<V> {
    fn zero() -> Self {
        Self::constant(V::zero())
    }
    fn is_zero(&self) -> bool {
        self.val.is_zero() && self.d.is_zero()
    }
}

impl<V: Scalar> One for Fwd<V> {
    fn one() -> Self {
        Self::constant(V::one())
    }
}

impl<V: Scalar> Num for Fwd<V> {
    type FromStrRadixErr = ParseFloatError;
    fn from_str_radix(src: &str, radix: u32) -> Result<Self, Self::FromStrRadixErr> {
        f64::from_str_radix(src, radix).map(Self::from_primitive)
    }
}

impl<V: Scalar> ToPrimitive for Fwd<V> {
    fn to_i64(&self) -> Option<i64> {
        self.value_of_rec().to_i64()
    }
    fn to_u64(&self) -> Option<u64> {
        self.value_of_rec().to_u64()
    }
    fn to_f64(&self) -> Option<f64> {
        Some(self.value_of_rec())
    }
}

impl<V: Scalar> FromPrimitive for Fwd<V> {
    fn from_i64(n: i64) -> Option<Self> {
        Some(Self::from_primitive(n as f64))
    }
    fn from_u64(n: u64) -> Option<Self> {
        Some(Self::from_primitive(n as f64))
    }
    fn from_f64(n: f64) -> Option<Self> {
        Some(Self::from_primitive(n))
    }
}

impl<V: Scalar> NumCast for Fwd<V> {
    fn from<T: ToPrimitive>(n: T) -> Option<Self> {
        n.to_f64().map(Self::from_primitive)
    }
}

impl<V: Scalar> Float for Fwd<V> {
    fn nan() -> Self {
        Self::constant(V::nan())
    }
    fn infinity() -> Self {
        Self::constant(V::infinity())
    }
    fn neg_infinity() -> Self {
        Self::constant(V::neg_infinity())
    }
    fn neg_zero() -> Self {
        Self::constant(V::neg_zero())
    }
    fn min_value() -> Self {
        Self::constant(V::min_value())
    }
    fn min_positive_value() -> Self {
        Self::constant(V::min_positive_value())
    }
    fn max_value() -> Self {
        Self::constant(V::max_value())
    }
    fn epsilon() -> Self {
        Self::constant(V::epsilon())
    }
    fn is_nan(self) -> bool {
        self.val.is_nan()
    }
    fn is_infinite(self) -> bool {
        self.val.is_infinite()
    }
    fn is_finite(self) -> bool {
        self.val.is_finite()
    }
    fn is_normal(self) -> bool {
        self.val.is_normal()
    }
    fn classify(self) -> FpCategory {
        self.val.classify()
    }

    // Piecewise constant: the tangent is exactly zero, whatever the input.
    fn floor(self) -> Self {
        Self::constant(self.val.floor())
    }
    fn ceil(self) -> Self {
        Self::constant(self.val.ceil())
    }
    fn round(self) -> Self {
        Self::constant(self.val.round())
    }
    fn trunc(self) -> Self {
        Self::constant(self.val.trunc())
    }
    fn signum(self) -> Self {
        Self::constant(self.val.signum())
    }

    fn fract(self) -> Self {
        Self::new(self.val.fract(), self.d)
    }
    fn abs(self) -> Self {
        self.lift(rules::abs)
    }
    fn is_sign_positive(self) -> bool {
        self.val.is_sign_positive()
    }
    fn is_sign_negative(self) -> bool {
        self.val.is_sign_negative()
    }
    fn mul_add(self, a: Self, b: Self) -> Self {
        let (val, ds, da, db) = rules::fma(self.val, a.val, b.val);
        Self::new(val, self.d * ds + a.d * da + b.d * db)
    }
    fn recip(self) -> Self {
        self.lift(rules::recip)
    }
    fn powi(self, n: i32) -> Self {
        self.lift(|x| rules::powi(x, n))
    }
    fn powf(self, n: Self) -> Self {
        self.lift2(n, rules::pow)
    }
    fn sqrt(self) -> Self {
        self.lift(rules::sqrt)
    }
    fn exp(self) -> Self {
        self.lift(rules::exp)
    }
    fn exp2(self) -> Self {
        self.lift(rules::exp2)
    }
    fn ln(self) -> Self {
        self.lift(rules::ln)
    }
    fn log(self, base: Self) -> Self {
        self.ln() / base.ln()
    }
    fn log2(self) -> Self {
        self.lift(rules::log2)
    }
    fn log10(self) -> Self {
        self.lift(rules::log10)
    }
    fn to_degrees(self) -> Self {
        self * (180.0 / std::f64::consts::PI)
    }
    fn to_radians(self) -> Self {
        self * (std::f64::consts::PI / 180.0)
    }

    // Selects an operand, tangent included. A NaN loses to a number.
    fn max(self, other: Self) -> Self {
        if self.is_nan() {
            other
        } else if other.is_nan() || self.val > other.val {
            self
        } else {
            other
        }
    }
    fn min(self, other: Self) -> Self {
        if self.is_nan() {
            other
        } else if other.is_nan() || self.val < other.val {
            self
        } else {
            other
        }
    }

    fn abs_sub(self, other: Self) -> Self {
        self.fdim(other)
    }
    fn cbrt(self) -> Self {
        self.lift(rules::cbrt)
    }
    fn hypot(self, other: Self) -> Self {
        self.lift2(other, rules::hypot)
    }
    fn sin(self) -> Self {
        self.lift(rules::sin)
    }
    fn cos(self) -> Self {
        self.lift(rules::cos)
    }
    fn tan(self) -> Self {
        self.lift(rules::tan)
    }
    fn asin(self) -> Self {
        self.lift(rules::asin)
    }
    fn acos(self) -> Self {
        self.lift(rules::acos)
    }
    fn atan(self) -> Self {
        self.lift(rules::atan)
    }
    fn atan2(self, other: Self) -> Self {
        self.lift2(other, rules::atan2)
    }
    fn sin_cos(self) -> (Self, Self) {
        (self.sin(), self.cos())
    }
    fn exp_m1(self) -> Self {
        self.lift(rules::exp_m1)
    }
    fn ln_1p(self) -> Self {
        self.lift(rules::ln_1p)
    }
    fn sinh(self) -> Self {
        self.lift(rules::sinh)
    }
    fn cosh(self) -> Self {
        self.lift(rules::cosh)
    }
    fn tanh(self) -> Self {
        self.lift(rules::tanh)
    }
    fn asinh(self) -> Self {
        self.lift(rules::asinh)
    }
    fn acosh(self) -> Self {
        self.lift(rules::acosh)
    }
    fn atanh(self) -> Self {
        self.lift(rules::atanh)
    }

    fn integer_decode(self) -> (u64, i16, i8) {
        self.val.integer_decode()
    }
}

impl<V: Scalar> Scalar for Fwd<V> {
    const NESTING: usize = V::NESTING + 1;

    fn from_primitive(x: f64) -> Self {
        Self::constant(V::from_primitive(x))
    }

    fn value_of_rec(&self) -> f64 {
        self.val.value_of_rec()
    }

    fn erf(self) -> Self {
        self.lift(rules::erf)
    }
    fn erfc(self) -> Self {
        self.lift(rules::erfc)
    }
    fn lgamma(self) -> Self {
        self.lift(rules::lgamma)
    }
    fn tgamma(self) -> Self {
        self.lift(rules::tgamma)
    }
    fn digamma(self) -> Self {
        self.lift(rules::digamma)
    }
    fn phi(self) -> Self {
        self.lift(rules::phi)
    }
    fn phi_approx(self) -> Self {
        self.lift(rules::phi_approx)
    }
    fn inv_logit(self) -> Self {
        self.lift(rules::inv_logit)
    }
    fn logit(self) -> Self {
        self.lift(rules::logit)
    }
    fn log_inv_logit(self) -> Self {
        self.lift(rules::log_inv_logit)
    }
    fn log1m_inv_logit(self) -> Self {
        self.lift(rules::log1m_inv_logit)
    }
    fn inv_cloglog(self) -> Self {
        self.lift(rules::inv_cloglog)
    }
    fn log1m(self) -> Self {
        self.lift(rules::log1m)
    }
    fn log1p_exp(self) -> Self {
        self.lift(rules::log1p_exp)
    }
    fn log1m_exp(self) -> Self {
        self.lift(rules::log1m_exp)
    }
    fn square(self) -> Self {
        self.lift(rules::square)
    }
    fn inv(self) -> Self {
        self.lift(rules::inv)
    }
    fn inv_sqrt(self) -> Self {
        self.lift(rules::inv_sqrt)
    }
    fn inv_square(self) -> Self {
        self.lift(rules::inv_square)
    }
    fn powc(self, c: f64) -> Self {
        self.lift(|x| rules::powc(x, c))
    }
    fn log_sum_exp(self, other: Self) -> Self {
        self.lift2(other, rules::log_sum_exp)
    }
    fn log_diff_exp(self, other: Self) -> Self {
        self.lift2(other, rules::log_diff_exp)
    }
    fn lbeta(self, other: Self) -> Self {
        self.lift2(other, rules::lbeta)
    }
    fn binomial_coefficient_log(self, k: Self) -> Self {
        self.lift2(k, rules::binomial_coefficient_log)
    }
    fn multiply_log(self, other: Self) -> Self {
        self.lift2(other, rules::multiply_log)
    }
    fn fdim(self, other: Self) -> Self {
        Self::constant(self.val.fdim(other.val))
    }
}
