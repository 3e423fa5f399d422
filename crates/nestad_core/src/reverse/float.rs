use super::Var;
use crate::rules;
use crate::traits::Scalar;
use num_traits::{Float, FromPrimitive, Num, NumCast, One, ParseFloatError, ToPrimitive, Zero};
use std::num::FpCategory;

impl Zero for Var<'_> {
    fn zero() -> Self {
        Var::constant(0.0)
    }
    fn is_zero(&self) -> bool {
        self.is_constant() && self.value == 0.0
    }
}

impl One for Var<'_> {
    fn one() -> Self {
        Var::constant(1.0)
    }
}

impl Num for Var<'_> {
    type FromStrRadixErr = ParseFloatError;
    fn from_str_radix(src: &str, radix: u32) -> Result<Self, Self::FromStrRadixErr> {
        f64::from_str_radix(src, radix).map(Var::constant)
    }
}

impl ToPrimitive for Var<'_> {
    fn to_i64(&self) -> Option<i64> {
        self.value.to_i64()
    }
    fn to_u64(&self) -> Option<u64> {
        self.value.to_u64()
    }
    fn to_f64(&self) -> Option<f64> {
        Some(self.value)
    }
}

impl FromPrimitive for Var<'_> {
    fn from_i64(n: i64) -> Option<Self> {
        Some(Var::constant(n as f64))
    }
    fn from_u64(n: u64) -> Option<Self> {
        Some(Var::constant(n as f64))
    }
    fn from_f64(n: f64) -> Option<Self> {
        Some(Var::constant(n))
    }
}

impl NumCast for Var<'_> {
    fn from<T: ToPrimitive>(n: T) -> Option<Self> {
        n.to_f64().map(Var::constant)
    }
}

impl Float for Var<'_> {
    fn nan() -> Self {
        Var::constant(f64::NAN)
    }
    fn infinity() -> Self {
        Var::constant(f64::INFINITY)
    }
    fn neg_infinity() -> Self {
        Var::constant(f64::NEG_INFINITY)
    }
    fn neg_zero() -> Self {
        Var::constant(-0.0)
    }
    fn min_value() -> Self {
        Var::constant(f64::MIN)
    }
    fn min_positive_value() -> Self {
        Var::constant(f64::MIN_POSITIVE)
    }
    fn max_value() -> Self {
        Var::constant(f64::MAX)
    }
    fn epsilon() -> Self {
        Var::constant(f64::EPSILON)
    }
    fn is_nan(self) -> bool {
        self.value.is_nan()
    }
    fn is_infinite(self) -> bool {
        self.value.is_infinite()
    }
    fn is_finite(self) -> bool {
        self.value.is_finite()
    }
    fn is_normal(self) -> bool {
        self.value.is_normal()
    }
    fn classify(self) -> FpCategory {
        self.value.classify()
    }

    fn floor(self) -> Self {
        Var::constant(self.value.floor())
    }
    fn ceil(self) -> Self {
        Var::constant(self.value.ceil())
    }
    fn round(self) -> Self {
        Var::constant(self.value.round())
    }
    fn trunc(self) -> Self {
        Var::constant(self.value.trunc())
    }
    fn signum(self) -> Self {
        Var::constant(self.value.signum())
    }

    fn fract(self) -> Self {
        self.unary(|a| (a.fract(), 1.0))
    }
    fn abs(self) -> Self {
        self.unary(rules::abs)
    }
    fn is_sign_positive(self) -> bool {
        self.value.is_sign_positive()
    }
    fn is_sign_negative(self) -> bool {
        self.value.is_sign_negative()
    }
    fn mul_add(self, a: Self, b: Self) -> Self {
        self * a + b
    }
    fn recip(self) -> Self {
        self.unary(rules::recip)
    }
    fn powi(self, n: i32) -> Self {
        self.unary(|a| rules::powi(a, n))
    }
    fn powf(self, n: Self) -> Self {
        self.binary(n, rules::pow)
    }
    fn sqrt(self) -> Self {
        self.unary(rules::sqrt)
    }
    fn exp(self) -> Self {
        self.unary(rules::exp)
    }
    fn exp2(self) -> Self {
        self.unary(rules::exp2)
    }
    fn ln(self) -> Self {
        self.unary(rules::ln)
    }
    fn log(self, base: Self) -> Self {
        self.ln() / base.ln()
    }
    fn log2(self) -> Self {
        self.unary(rules::log2)
    }
    fn log10(self) -> Self {
        self.unary(rules::log10)
    }
    fn to_degrees(self) -> Self {
        self * (180.0 / std::f64::consts::PI)
    }
    fn to_radians(self) -> Self {
        self * (std::f64::consts::PI / 180.0)
    }
    fn max(self, other: Self) -> Self {
        self.binary(other, rules::fmax)
    }
    fn min(self, other: Self) -> Self {
        self.binary(other, rules::fmin)
    }
    fn abs_sub(self, other: Self) -> Self {
        self.fdim(other)
    }
    fn cbrt(self) -> Self {
        self.unary(rules::cbrt)
    }
    fn hypot(self, other: Self) -> Self {
        self.binary(other, rules::hypot)
    }
    fn sin(self) -> Self {
        self.unary(rules::sin)
    }
    fn cos(self) -> Self {
        self.unary(rules::cos)
    }
    fn tan(self) -> Self {
        self.unary(rules::tan)
    }
    fn asin(self) -> Self {
        self.unary(rules::asin)
    }
    fn acos(self) -> Self {
        self.unary(rules::acos)
    }
    fn atan(self) -> Self {
        self.unary(rules::atan)
    }
    fn atan2(self, other: Self) -> Self {
        self.binary(other, rules::atan2)
    }
    fn sin_cos(self) -> (Self, Self) {
        (self.sin(), self.cos())
    }
    fn exp_m1(self) -> Self {
        self.unary(rules::exp_m1)
    }
    fn ln_1p(self) -> Self {
        self.unary(rules::ln_1p)
    }
    fn sinh(self) -> Self {
        self.unary(rules::sinh)
    }
    fn cosh(self) -> Self {
        self.unary(rules::cosh)
    }
    fn tanh(self) -> Self {
        self.unary(rules::tanh)
    }
    fn asinh(self) -> Self {
        self.unary(rules::asinh)
    }
    fn acosh(self) -> Self {
        self.unary(rules::acosh)
    }
    fn atanh(self) -> Self {
        self.unary(rules::atanh)
    }
    fn integer_decode(self) -> (u64, i16, i8) {
        self.value.integer_decode()
    }
}

impl Scalar for Var<'_> {
    const NESTING: usize = 0;

    fn from_primitive(x: f64) -> Self {
        Var::constant(x)
    }

    fn value_of_rec(&self) -> f64 {
        self.value
    }

    fn erf(self) -> Self {
        self.unary(rules::erf)
    }
    fn erfc(self) -> Self {
        self.unary(rules::erfc)
    }
    fn lgamma(self) -> Self {
        self.unary(rules::lgamma)
    }
    fn tgamma(self) -> Self {
        self.unary(rules::tgamma)
    }
    fn digamma(self) -> Self {
        self.unary(rules::digamma)
    }
    fn phi(self) -> Self {
        self.unary(rules::phi)
    }
    fn phi_approx(self) -> Self {
        self.unary(rules::phi_approx)
    }
    fn inv_logit(self) -> Self {
        self.unary(rules::inv_logit)
    }
    fn logit(self) -> Self {
        self.unary(rules::logit)
    }
    fn log_inv_logit(self) -> Self {
        self.unary(rules::log_inv_logit)
    }
    fn log1m_inv_logit(self) -> Self {
        self.unary(rules::log1m_inv_logit)
    }
    fn inv_cloglog(self) -> Self {
        self.unary(rules::inv_cloglog)
    }
    fn log1m(self) -> Self {
        self.unary(rules::log1m)
    }
    fn log1p_exp(self) -> Self {
        self.unary(rules::log1p_exp)
    }
    fn log1m_exp(self) -> Self {
        self.unary(rules::log1m_exp)
    }
    fn square(self) -> Self {
        self.unary(rules::square)
    }
    fn inv(self) -> Self {
        self.unary(rules::inv)
    }
    fn inv_sqrt(self) -> Self {
        self.unary(rules::inv_sqrt)
    }
    fn inv_square(self) -> Self {
        self.unary(rules::inv_square)
    }
    fn powc(self, c: f64) -> Self {
        self.unary(|a| rules::powc(a, c))
    }
    fn log_sum_exp(self, other: Self) -> Self {
        self.binary(other, rules::log_sum_exp)
    }
    fn log_diff_exp(self, other: Self) -> Self {
        self.binary(other, rules::log_diff_exp)
    }
    fn lbeta(self, other: Self) -> Self {
        self.binary(other, rules::lbeta)
    }
    fn binomial_coefficient_log(self, k: Self) -> Self {
        self.binary(k, rules::binomial_coefficient_log)
    }
    fn multiply_log(self, other: Self) -> Self {
        self.binary(other, rules::multiply_log)
    }
    fn fdim(self, other: Self) -> Self {
        Var::constant(self.value.fdim(other.value))
    }
}
