//! Primitive (`f64`) special functions, plus the few that are written once for any
//! [`Scalar`] and differentiated by composition.

use crate::traits::Scalar;
use std::f64::consts::{FRAC_1_SQRT_2, LN_2, PI};

pub fn erf(x: f64) -> f64 {
    libm::erf(x)
}

pub fn erfc(x: f64) -> f64 {
    libm::erfc(x)
}

pub fn lgamma(x: f64) -> f64 {
    libm::lgamma(x)
}

pub fn tgamma(x: f64) -> f64 {
    libm::tgamma(x)
}

/// Compute digamma(x) = Gamma'(x)/Gamma(x).
///
/// Poles (non-positive integers) evaluate to NaN.
pub fn digamma(x: f64) -> f64 {
    if x.is_nan() || x == f64::NEG_INFINITY {
        return f64::NAN;
    }
    if x == f64::INFINITY {
        return f64::INFINITY;
    }
    if x <= 0.0 && x == x.floor() {
        return f64::NAN;
    }
    if x < 0.0 {
        // Reflection: psi(1 - x) - psi(x) = pi * cot(pi * x)
        return digamma(1.0 - x) - PI / (PI * x).tan();
    }

    let mut x = x;
    let mut result = 0.0;

    // Use recurrence for x < 10
    while x < 10.0 {
        result -= 1.0 / x;
        x += 1.0;
    }

    // Asymptotic expansion for large x
    result += x.ln() - 0.5 / x;
    let x2 = 1.0 / (x * x);
    result -= x2
        * (1.0 / 12.0
            - x2 * (1.0 / 120.0 - x2 * (1.0 / 252.0 - x2 * (1.0 / 240.0 - x2 / 132.0))));

    result
}

/// Trigamma, the derivative of digamma, for any scalar.
///
/// Only arithmetic and `sin` are used, so derivatives of any order come from
/// differentiating the series itself.
pub fn trigamma<S: Scalar>(x: S) -> S {
    const SMALL: f64 = 1e-4;
    const LARGE: f64 = 6.0;
    const B2: f64 = 1.0 / 6.0;
    const B4: f64 = -1.0 / 30.0;
    const B6: f64 = 1.0 / 42.0;
    const B8: f64 = -1.0 / 30.0;

    if x <= S::zero() && x.floor() == x {
        return S::infinity();
    }
    if x <= S::zero() {
        let s = (x * -PI).sin();
        return -trigamma(-x + 1.0) + (S::from_primitive(PI) / s).powi(2);
    }
    if x <= S::from_primitive(SMALL) {
        return (x * x).recip();
    }

    let large = S::from_primitive(LARGE);
    let mut z = x;
    let mut value = S::zero();
    while z < large {
        value += (z * z).recip();
        z = z + 1.0;
    }

    let y = (z * z).recip();
    value + y * 0.5 + (y * (y * (y * (y * B8 + B6) + B4) + B2) + 1.0) / z
}

/// Standard normal CDF, saturating to 0 and 1 in the far tails.
pub fn phi(x: f64) -> f64 {
    if x < -37.5 {
        0.0
    } else if x < -5.0 {
        0.5 * erfc(-x * FRAC_1_SQRT_2)
    } else if x > 8.25 {
        1.0
    } else {
        0.5 * (1.0 + erf(x * FRAC_1_SQRT_2))
    }
}

pub fn phi_approx(x: f64) -> f64 {
    inv_logit(0.07056 * x * x * x + 1.5976 * x)
}

pub fn inv_logit(x: f64) -> f64 {
    if x < 0.0 {
        let e = x.exp();
        if x < f64::EPSILON.ln() {
            e
        } else {
            e / (1.0 + e)
        }
    } else {
        1.0 / (1.0 + (-x).exp())
    }
}

pub fn logit(x: f64) -> f64 {
    (x / (1.0 - x)).ln()
}

pub fn log_inv_logit(x: f64) -> f64 {
    if x < 0.0 {
        x - x.exp().ln_1p()
    } else {
        -(-x).exp().ln_1p()
    }
}

pub fn log1m_inv_logit(x: f64) -> f64 {
    if x > 0.0 {
        -x - (-x).exp().ln_1p()
    } else {
        -x.exp().ln_1p()
    }
}

pub fn inv_cloglog(x: f64) -> f64 {
    1.0 - (-x.exp()).exp()
}

pub fn log1m(x: f64) -> f64 {
    (-x).ln_1p()
}

pub fn log1p_exp(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

pub fn log1m_exp(x: f64) -> f64 {
    if x > 0.0 {
        f64::NAN
    } else if x > -LN_2 {
        (-x.exp_m1()).ln()
    } else {
        log1m(x.exp())
    }
}

pub fn log_sum_exp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if a == f64::INFINITY && b == f64::INFINITY {
        return f64::INFINITY;
    }
    if a > b {
        a + log1p_exp(b - a)
    } else {
        b + log1p_exp(a - b)
    }
}

pub fn log_diff_exp(a: f64, b: f64) -> f64 {
    if b > a {
        return f64::NAN;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    a + log1m_exp(b - a)
}

pub fn lbeta(a: f64, b: f64) -> f64 {
    lgamma(a) + lgamma(b) - lgamma(a + b)
}

pub fn binomial_coefficient_log(n: f64, k: f64) -> f64 {
    lgamma(n + 1.0) - lgamma(k + 1.0) - lgamma(n - k + 1.0)
}

pub fn multiply_log(a: f64, b: f64) -> f64 {
    if a == 0.0 && b == 0.0 {
        0.0
    } else {
        a * b.ln()
    }
}

pub fn fdim(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else if a > b {
        a - b
    } else {
        0.0
    }
}

impl Scalar for f64 {
    const NESTING: usize = 0;

    #[inline]
    fn from_primitive(x: f64) -> Self {
        x
    }

    #[inline]
    fn value_of_rec(&self) -> f64 {
        *self
    }

    fn erf(self) -> Self {
        erf(self)
    }
    fn erfc(self) -> Self {
        erfc(self)
    }
    fn lgamma(self) -> Self {
        lgamma(self)
    }
    fn tgamma(self) -> Self {
        tgamma(self)
    }
    fn digamma(self) -> Self {
        digamma(self)
    }
    fn phi(self) -> Self {
        phi(self)
    }
    fn phi_approx(self) -> Self {
        phi_approx(self)
    }
    fn inv_logit(self) -> Self {
        inv_logit(self)
    }
    fn logit(self) -> Self {
        logit(self)
    }
    fn log_inv_logit(self) -> Self {
        log_inv_logit(self)
    }
    fn log1m_inv_logit(self) -> Self {
        log1m_inv_logit(self)
    }
    fn inv_cloglog(self) -> Self {
        inv_cloglog(self)
    }
    fn log1m(self) -> Self {
        log1m(self)
    }
    fn log1p_exp(self) -> Self {
        log1p_exp(self)
    }
    fn log1m_exp(self) -> Self {
        log1m_exp(self)
    }
    fn square(self) -> Self {
        self * self
    }
    fn inv(self) -> Self {
        1.0 / self
    }
    fn inv_sqrt(self) -> Self {
        1.0 / self.sqrt()
    }
    fn inv_square(self) -> Self {
        1.0 / (self * self)
    }
    fn powc(self, c: f64) -> Self {
        self.powf(c)
    }
    fn log_sum_exp(self, other: Self) -> Self {
        log_sum_exp(self, other)
    }
    fn log_diff_exp(self, other: Self) -> Self {
        log_diff_exp(self, other)
    }
    fn lbeta(self, other: Self) -> Self {
        lbeta(self, other)
    }
    fn binomial_coefficient_log(self, k: Self) -> Self {
        binomial_coefficient_log(self, k)
    }
    fn multiply_log(self, other: Self) -> Self {
        multiply_log(self, other)
    }
    fn fdim(self, other: Self) -> Self {
        fdim(self, other)
    }
}
