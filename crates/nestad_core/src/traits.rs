use num_traits::{Float, FromPrimitive};
use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

/// A value domain that differentiable code can run on.
///
/// Implemented by `f64`, by the reverse-mode [`Var`](crate::reverse::Var) and by
/// [`Fwd<V>`](crate::fwd::Fwd) for every `V: Scalar`, so dual numbers nest to any depth.
/// Mixed arithmetic with bare `f64` constants is part of the contract: a constant never
/// has to be materialised as a differentiable value.
///
/// The named functions below are the ones `num_traits::Float` does not cover. Each has a
/// single generic derivative rule in [`crate::rules`].
pub trait Scalar:
    Float
    + FromPrimitive
    + Default
    + Debug
    + Display
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
{
    /// Number of forward-mode layers wrapped around the primitive value.
    const NESTING: usize;

    /// Lifts a primitive constant. Every tangent, at every level, is zero.
    fn from_primitive(x: f64) -> Self;

    /// The primitive value after peeling all `NESTING` layers.
    fn value_of_rec(&self) -> f64;

    fn erf(self) -> Self;
    fn erfc(self) -> Self;
    /// Natural log of the absolute value of the gamma function.
    fn lgamma(self) -> Self;
    fn tgamma(self) -> Self;
    fn digamma(self) -> Self;

    fn trigamma(self) -> Self {
        crate::special::trigamma(self)
    }

    /// Standard normal cumulative distribution function.
    fn phi(self) -> Self;
    /// Logistic approximation of [`Scalar::phi`].
    fn phi_approx(self) -> Self;
    fn inv_logit(self) -> Self;
    fn logit(self) -> Self;
    fn log_inv_logit(self) -> Self;
    fn log1m_inv_logit(self) -> Self;
    fn inv_cloglog(self) -> Self;
    /// `ln(1 - x)`.
    fn log1m(self) -> Self;
    /// `ln(1 + exp(x))`.
    fn log1p_exp(self) -> Self;
    /// `ln(1 - exp(x))`.
    fn log1m_exp(self) -> Self;
    fn square(self) -> Self;
    fn inv(self) -> Self;
    fn inv_sqrt(self) -> Self;
    fn inv_square(self) -> Self;
    /// `self^c` for a constant exponent. The exponent is never differentiated, so this is
    /// well defined at a non-positive base at every nesting depth.
    fn powc(self, c: f64) -> Self;

    /// `ln(exp(self) + exp(other))` without overflow.
    fn log_sum_exp(self, other: Self) -> Self;
    /// `ln(exp(self) - exp(other))`, NaN when `other > self`.
    fn log_diff_exp(self, other: Self) -> Self;
    /// Log of the beta function.
    fn lbeta(self, other: Self) -> Self;
    /// Log of the generalised binomial coefficient `n choose k`.
    fn binomial_coefficient_log(self, k: Self) -> Self;
    /// `self * ln(other)`, with `0 * ln(0) = 0`.
    fn multiply_log(self, other: Self) -> Self;
    /// Positive difference `max(self - other, 0)`. Not differentiable: the tangent is zero.
    fn fdim(self, other: Self) -> Self;
}

/// The right-hand side of an ODE `dx/dt = f(t, x)`.
///
/// Generic over the scalar so parameters captured by the system can carry tangents.
pub trait DynamicalSystem<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field at `(t, x)` into `out`.
    fn apply(&self, t: T, x: &[T], out: &mut [T]);
}

/// A fixed-step integrator.
pub trait Steppable<T: Scalar> {
    /// Performs one step of size `dt`, advancing `t` and `state` in place.
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T);
}
