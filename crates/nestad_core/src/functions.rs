//! Named functions callable with any mix of differentiable scalars and bare `f64`
//! constants.
//!
//! Each binary function is a trait implemented for `(Fwd, Fwd)`, `(Fwd, f64)`,
//! `(f64, Fwd)`, the same three `Var` combinations and `(f64, f64)`, and exposed as a
//! free function. A constant operand contributes no tangent term and is never lifted to
//! a dual number.
//!
//! ```
//! use nestad_core::functions::log_sum_exp;
//! use nestad_core::Fwd;
//!
//! let x = Fwd::new(1.0, 1.0);
//! let y = log_sum_exp(x, 2.0);
//! let e1 = 1f64.exp();
//! let e2 = 2f64.exp();
//! assert!((y.d - e1 / (e1 + e2)).abs() < 1e-12);
//! ```

use crate::fwd::Fwd;
use crate::reverse::Var;
use crate::rules::{self, Binary};
use crate::traits::Scalar;
use num_traits::{Float, Pow};

macro_rules! binary_function {
    ($(#[$doc:meta])* $Trait:ident, $method:ident, $rule:path) => {
        $(#[$doc])*
        pub trait $Trait<Rhs = Self> {
            type Output;
            fn $method(self, rhs: Rhs) -> Self::Output;
        }

        impl $Trait for f64 {
            type Output = f64;
            fn $method(self, rhs: f64) -> f64 {
                let (value, _, _): Binary<f64> = $rule(self, rhs);
                value
            }
        }

        impl<V: Scalar> $Trait for Fwd<V> {
            type Output = Fwd<V>;
            fn $method(self, rhs: Fwd<V>) -> Fwd<V> {
                self.lift2(rhs, $rule)
            }
        }

        impl<V: Scalar> $Trait<f64> for Fwd<V> {
            type Output = Fwd<V>;
            fn $method(self, rhs: f64) -> Fwd<V> {
                self.lift2_lhs(rhs, $rule)
            }
        }

        impl<V: Scalar> $Trait<Fwd<V>> for f64 {
            type Output = Fwd<V>;
            fn $method(self, rhs: Fwd<V>) -> Fwd<V> {
                Fwd::lift2_rhs(self, rhs, $rule)
            }
        }

        impl<'t> $Trait for Var<'t> {
            type Output = Var<'t>;
            fn $method(self, rhs: Var<'t>) -> Var<'t> {
                self.binary(rhs, $rule)
            }
        }

        impl<'t> $Trait<f64> for Var<'t> {
            type Output = Var<'t>;
            fn $method(self, rhs: f64) -> Var<'t> {
                self.binary(Var::constant(rhs), $rule)
            }
        }

        impl<'t> $Trait<Var<'t>> for f64 {
            type Output = Var<'t>;
            fn $method(self, rhs: Var<'t>) -> Var<'t> {
                Var::constant(self).binary(rhs, $rule)
            }
        }

        $(#[$doc])*
        pub fn $method<A: $Trait<B>, B>(a: A, b: B) -> A::Output {
            a.$method(b)
        }
    };
}

binary_function!(
    /// `ln(exp(a) + exp(b))` without overflow.
    LogSumExp, log_sum_exp, rules::log_sum_exp
);
binary_function!(
    /// `ln(exp(a) - exp(b))`; NaN when `b > a`.
    LogDiffExp, log_diff_exp, rules::log_diff_exp
);
binary_function!(
    /// Four-quadrant arctangent of `a / b`.
    Atan2, atan2, rules::atan2
);
binary_function!(Hypot, hypot, rules::hypot);
binary_function!(
    /// The larger operand; a NaN loses to a number.
    Fmax, fmax, rules::fmax
);
binary_function!(
    /// The smaller operand; a NaN loses to a number.
    Fmin, fmin, rules::fmin
);
binary_function!(Fmod, fmod, rules::fmod);
binary_function!(Lbeta, lbeta, rules::lbeta);
binary_function!(
    BinomialCoefficientLog,
    binomial_coefficient_log,
    rules::binomial_coefficient_log
);
binary_function!(
    /// `a * ln(b)`, with `0 * ln(0) = 0`.
    MultiplyLog, multiply_log, rules::multiply_log
);

/// Positive difference `max(a - b, 0)`.
///
/// Not differentiable: the tangent is zero whatever the operands.
pub trait Fdim<Rhs = Self> {
    type Output;
    fn fdim(self, rhs: Rhs) -> Self::Output;
}

impl<S: Scalar> Fdim for S {
    type Output = S;
    fn fdim(self, rhs: S) -> S {
        Scalar::fdim(self, rhs)
    }
}

impl<V: Scalar> Fdim<f64> for Fwd<V> {
    type Output = Fwd<V>;
    fn fdim(self, rhs: f64) -> Fwd<V> {
        Fwd::constant(self.val.fdim(V::from_primitive(rhs)))
    }
}

impl<V: Scalar> Fdim<Fwd<V>> for f64 {
    type Output = Fwd<V>;
    fn fdim(self, rhs: Fwd<V>) -> Fwd<V> {
        Fwd::constant(V::from_primitive(self).fdim(rhs.val))
    }
}

impl<'t> Fdim<f64> for Var<'t> {
    type Output = Var<'t>;
    fn fdim(self, rhs: f64) -> Var<'t> {
        Scalar::fdim(self, Var::constant(rhs))
    }
}

impl<'t> Fdim<Var<'t>> for f64 {
    type Output = Var<'t>;
    fn fdim(self, rhs: Var<'t>) -> Var<'t> {
        Scalar::fdim(Var::constant(self), rhs)
    }
}

pub fn fdim<A: Fdim<B>, B>(a: A, b: B) -> A::Output {
    a.fdim(b)
}

// Powers go through num_traits::Pow; a constant exponent goes to `Scalar::powc`.

impl<V: Scalar> Pow<Fwd<V>> for Fwd<V> {
    type Output = Fwd<V>;
    fn pow(self, rhs: Fwd<V>) -> Fwd<V> {
        self.lift2(rhs, rules::pow)
    }
}

impl<V: Scalar> Pow<f64> for Fwd<V> {
    type Output = Fwd<V>;
    fn pow(self, rhs: f64) -> Fwd<V> {
        self.powc(rhs)
    }
}

impl<V: Scalar> Pow<i32> for Fwd<V> {
    type Output = Fwd<V>;
    fn pow(self, rhs: i32) -> Fwd<V> {
        self.powi(rhs)
    }
}

impl<V: Scalar> Pow<Fwd<V>> for f64 {
    type Output = Fwd<V>;
    fn pow(self, rhs: Fwd<V>) -> Fwd<V> {
        Fwd::lift2_rhs(self, rhs, rules::pow)
    }
}

impl<'t> Pow<Var<'t>> for Var<'t> {
    type Output = Var<'t>;
    fn pow(self, rhs: Var<'t>) -> Var<'t> {
        self.binary(rhs, rules::pow)
    }
}

impl<'t> Pow<f64> for Var<'t> {
    type Output = Var<'t>;
    fn pow(self, rhs: f64) -> Var<'t> {
        self.powc(rhs)
    }
}

impl<'t> Pow<i32> for Var<'t> {
    type Output = Var<'t>;
    fn pow(self, rhs: i32) -> Var<'t> {
        self.powi(rhs)
    }
}

impl<'t> Pow<Var<'t>> for f64 {
    type Output = Var<'t>;
    fn pow(self, rhs: Var<'t>) -> Var<'t> {
        Var::constant(self).binary(rhs, rules::pow)
    }
}

pub fn pow<A: Pow<B>, B>(a: A, b: B) -> A::Output {
    a.pow(b)
}

/// Fused `a * b + c`.
pub fn fma<S: Scalar>(a: S, b: S, c: S) -> S {
    a.mul_add(b, c)
}

/// Log density of a two-component mixture:
/// `ln(theta * exp(lambda1) + (1 - theta) * exp(lambda2))`.
pub fn log_mix<S: Scalar>(theta: S, lambda1: S, lambda2: S) -> S {
    (theta.ln() + lambda1).log_sum_exp(theta.log1m() + lambda2)
}

/// Heaviside step: `0` for negative values, `1` otherwise. The tangent is zero.
pub fn step<S: Scalar>(x: S) -> S {
    if x < S::zero() {
        S::zero()
    } else {
        S::one()
    }
}

pub fn is_nan<S: Scalar>(x: S) -> bool {
    x.is_nan()
}

pub fn is_inf<S: Scalar>(x: S) -> bool {
    x.is_infinite()
}

/// The innermost primitive value of any scalar.
pub fn value_of_rec<S: Scalar>(x: S) -> f64 {
    x.value_of_rec()
}
