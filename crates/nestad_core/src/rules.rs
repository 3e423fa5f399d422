//! Derivative table.
//!
//! One function per differentiable operation, returning the value together with the
//! local partial derivative(s) with respect to each operand, evaluated at the operand
//! values. Everything here is generic over [`Scalar`], so the same rule serves
//! `Fwd<f64>`, `Fwd<Fwd<f64>>` and the reverse tape (which evaluates it at `f64`).

use crate::traits::Scalar;
use std::f64::consts::{LN_10, LN_2, PI};

const FRAC_2_SQRT_PI: f64 = std::f64::consts::FRAC_2_SQRT_PI;

pub type Unary<S> = (S, S);
pub type Binary<S> = (S, S, S);

// Arithmetic

pub fn add<S: Scalar>(a: S, b: S) -> Binary<S> {
    (a + b, S::one(), S::one())
}

pub fn sub<S: Scalar>(a: S, b: S) -> Binary<S> {
    (a - b, S::one(), -S::one())
}

pub fn mul<S: Scalar>(a: S, b: S) -> Binary<S> {
    (a * b, b, a)
}

pub fn div<S: Scalar>(a: S, b: S) -> Binary<S> {
    let q = a / b;
    (q, b.recip(), -q / b)
}

/// Truncated remainder; `d(a mod b) = da - trunc(a / b) db`.
pub fn fmod<S: Scalar>(a: S, b: S) -> Binary<S> {
    (a % b, S::one(), -(a / b).trunc())
}

pub fn fma<S: Scalar>(a: S, b: S, c: S) -> (S, S, S, S) {
    (a.mul_add(b, c), b, a, S::one())
}

// Powers and roots

pub fn sqrt<S: Scalar>(x: S) -> Unary<S> {
    let s = x.sqrt();
    (s, (s * 2.0).recip())
}

pub fn cbrt<S: Scalar>(x: S) -> Unary<S> {
    let c = x.cbrt();
    (c, (c * c * 3.0).recip())
}

pub fn powi<S: Scalar>(x: S, n: i32) -> Unary<S> {
    if n == 0 {
        return (S::one(), S::zero());
    }
    let slope = match n.checked_sub(1) {
        Some(m) => x.powi(m),
        None => x.powc(f64::from(n) - 1.0),
    };
    (x.powi(n), slope * f64::from(n))
}

/// Power with a constant exponent: only the base partial.
pub fn powc<S: Scalar>(x: S, c: f64) -> Unary<S> {
    if c == 0.0 {
        return (S::one(), S::zero());
    }
    (x.powc(c), x.powc(c - 1.0) * c)
}

pub fn pow<S: Scalar>(a: S, b: S) -> Binary<S> {
    let p = a.powf(b);
    (p, b * a.powf(b - 1.0), p * a.ln())
}

pub fn hypot<S: Scalar>(a: S, b: S) -> Binary<S> {
    let h = a.hypot(b);
    (h, a / h, b / h)
}

pub fn square<S: Scalar>(x: S) -> Unary<S> {
    (x.square(), x * 2.0)
}

pub fn recip<S: Scalar>(x: S) -> Unary<S> {
    (x.recip(), -(x * x).recip())
}

pub fn inv<S: Scalar>(x: S) -> Unary<S> {
    (x.inv(), -x.inv_square())
}

pub fn inv_sqrt<S: Scalar>(x: S) -> Unary<S> {
    let r = x.inv_sqrt();
    (r, -r / x * 0.5)
}

pub fn inv_square<S: Scalar>(x: S) -> Unary<S> {
    (x.inv_square(), -(x * x * x).recip() * 2.0)
}

pub fn abs<S: Scalar>(x: S) -> Unary<S> {
    let slope = if x >= S::zero() {
        S::one()
    } else if x < S::zero() {
        -S::one()
    } else {
        S::nan()
    };
    (x.abs(), slope)
}

// Exponentials and logarithms

pub fn exp<S: Scalar>(x: S) -> Unary<S> {
    let e = x.exp();
    (e, e)
}

pub fn exp2<S: Scalar>(x: S) -> Unary<S> {
    let e = x.exp2();
    (e, e * LN_2)
}

pub fn exp_m1<S: Scalar>(x: S) -> Unary<S> {
    (x.exp_m1(), x.exp())
}

pub fn ln<S: Scalar>(x: S) -> Unary<S> {
    if x < S::zero() {
        return (S::nan(), S::nan());
    }
    (x.ln(), x.recip())
}

pub fn log2<S: Scalar>(x: S) -> Unary<S> {
    if x < S::zero() {
        return (S::nan(), S::nan());
    }
    (x.log2(), (x * LN_2).recip())
}

pub fn log10<S: Scalar>(x: S) -> Unary<S> {
    if x < S::zero() {
        return (S::nan(), S::nan());
    }
    (x.log10(), (x * LN_10).recip())
}

pub fn ln_1p<S: Scalar>(x: S) -> Unary<S> {
    (x.ln_1p(), (x + 1.0).recip())
}

pub fn log1m<S: Scalar>(x: S) -> Unary<S> {
    (x.log1m(), (x - 1.0).recip())
}

pub fn log1p_exp<S: Scalar>(x: S) -> Unary<S> {
    (x.log1p_exp(), x.inv_logit())
}

pub fn log1m_exp<S: Scalar>(x: S) -> Unary<S> {
    (x.log1m_exp(), -(-x).exp_m1().recip())
}

pub fn log_sum_exp<S: Scalar>(a: S, b: S) -> Binary<S> {
    (a.log_sum_exp(b), (a - b).inv_logit(), (b - a).inv_logit())
}

pub fn log_diff_exp<S: Scalar>(a: S, b: S) -> Binary<S> {
    (
        a.log_diff_exp(b),
        -(b - a).exp_m1().recip(),
        -(a - b).exp_m1().recip(),
    )
}

pub fn multiply_log<S: Scalar>(a: S, b: S) -> Binary<S> {
    (a.multiply_log(b), b.ln(), a / b)
}

// Trigonometric and hyperbolic

pub fn sin<S: Scalar>(x: S) -> Unary<S> {
    (x.sin(), x.cos())
}

pub fn cos<S: Scalar>(x: S) -> Unary<S> {
    (x.cos(), -x.sin())
}

pub fn tan<S: Scalar>(x: S) -> Unary<S> {
    let t = x.tan();
    (t, t * t + 1.0)
}

pub fn asin<S: Scalar>(x: S) -> Unary<S> {
    (x.asin(), (-(x * x) + 1.0).sqrt().recip())
}

pub fn acos<S: Scalar>(x: S) -> Unary<S> {
    (x.acos(), -(-(x * x) + 1.0).sqrt().recip())
}

pub fn atan<S: Scalar>(x: S) -> Unary<S> {
    (x.atan(), (x * x + 1.0).recip())
}

pub fn atan2<S: Scalar>(y: S, x: S) -> Binary<S> {
    let r = x * x + y * y;
    (y.atan2(x), x / r, -y / r)
}

pub fn sinh<S: Scalar>(x: S) -> Unary<S> {
    (x.sinh(), x.cosh())
}

pub fn cosh<S: Scalar>(x: S) -> Unary<S> {
    (x.cosh(), x.sinh())
}

pub fn tanh<S: Scalar>(x: S) -> Unary<S> {
    let t = x.tanh();
    (t, -(t * t) + 1.0)
}

pub fn asinh<S: Scalar>(x: S) -> Unary<S> {
    (x.asinh(), (x * x + 1.0).sqrt().recip())
}

pub fn acosh<S: Scalar>(x: S) -> Unary<S> {
    (x.acosh(), (x * x - 1.0).sqrt().recip())
}

pub fn atanh<S: Scalar>(x: S) -> Unary<S> {
    (x.atanh(), (-(x * x) + 1.0).recip())
}

// Special functions

pub fn erf<S: Scalar>(x: S) -> Unary<S> {
    (x.erf(), (-(x * x)).exp() * FRAC_2_SQRT_PI)
}

pub fn erfc<S: Scalar>(x: S) -> Unary<S> {
    (x.erfc(), (-(x * x)).exp() * -FRAC_2_SQRT_PI)
}

pub fn lgamma<S: Scalar>(x: S) -> Unary<S> {
    (x.lgamma(), x.digamma())
}

pub fn tgamma<S: Scalar>(x: S) -> Unary<S> {
    let g = x.tgamma();
    (g, g * x.digamma())
}

pub fn digamma<S: Scalar>(x: S) -> Unary<S> {
    (x.digamma(), x.trigamma())
}

pub fn lbeta<S: Scalar>(a: S, b: S) -> Binary<S> {
    let dab = (a + b).digamma();
    (a.lbeta(b), a.digamma() - dab, b.digamma() - dab)
}

pub fn binomial_coefficient_log<S: Scalar>(n: S, k: S) -> Binary<S> {
    let dnk = (n - k + 1.0).digamma();
    (
        n.binomial_coefficient_log(k),
        (n + 1.0).digamma() - dnk,
        dnk - (k + 1.0).digamma(),
    )
}

pub fn phi<S: Scalar>(x: S) -> Unary<S> {
    (x.phi(), (x * x * -0.5).exp() / (2.0 * PI).sqrt())
}

pub fn phi_approx<S: Scalar>(x: S) -> Unary<S> {
    let f = x.phi_approx();
    (f, f * (-f + 1.0) * (x * x * (3.0 * 0.07056) + 1.5976))
}

pub fn inv_logit<S: Scalar>(x: S) -> Unary<S> {
    let f = x.inv_logit();
    (f, f * (-f + 1.0))
}

pub fn logit<S: Scalar>(x: S) -> Unary<S> {
    (x.logit(), (x - x * x).recip())
}

pub fn log_inv_logit<S: Scalar>(x: S) -> Unary<S> {
    (x.log_inv_logit(), (-x).inv_logit())
}

pub fn log1m_inv_logit<S: Scalar>(x: S) -> Unary<S> {
    (x.log1m_inv_logit(), -x.inv_logit())
}

pub fn inv_cloglog<S: Scalar>(x: S) -> Unary<S> {
    (x.inv_cloglog(), (x - x.exp()).exp())
}

// Selection

/// IEEE `fmax`: a NaN operand loses to a number.
pub fn fmax<S: Scalar>(a: S, b: S) -> Binary<S> {
    if a.is_nan() || (!b.is_nan() && b >= a) {
        (b, S::zero(), S::one())
    } else {
        (a, S::one(), S::zero())
    }
}

/// IEEE `fmin`: a NaN operand loses to a number.
pub fn fmin<S: Scalar>(a: S, b: S) -> Binary<S> {
    if a.is_nan() || (!b.is_nan() && b <= a) {
        (b, S::zero(), S::one())
    } else {
        (a, S::one(), S::zero())
    }
}
