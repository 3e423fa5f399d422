//! Forward-mode dual numbers.
//!
//! `Fwd<V>` carries a value and a tangent (directional derivative) in the same domain
//! `V`. Since `Fwd<V>` is itself a [`Scalar`], it nests: `Fwd<Fwd<f64>>` carries second
//! derivatives and `Fwd<Var>` runs forward mode over the reverse tape.

mod float;

use crate::rules::{self, Binary, Unary};
use crate::traits::Scalar;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter::{Product, Sum};
use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};

/// Dual number over the value domain `V`.
/// val: value
/// d: tangent
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Fwd<V> {
    pub val: V,
    pub d: V,
}

impl<V: Scalar> Fwd<V> {
    pub fn new(val: V, d: V) -> Self {
        Self { val, d }
    }

    /// A constant: zero tangent.
    pub fn constant(val: V) -> Self {
        Self::new(val, V::zero())
    }

    /// An independent variable seeded with a unit tangent.
    pub fn variable(val: V) -> Self {
        Self::new(val, V::one())
    }

    /// Peels one level of nesting.
    pub fn value(&self) -> V {
        self.val
    }

    pub fn tangent(&self) -> V {
        self.d
    }

    /// Applies a unary rule from the derivative table.
    #[inline]
    pub(crate) fn lift(self, rule: impl FnOnce(V) -> Unary<V>) -> Self {
        let (val, dx) = rule(self.val);
        Self::new(val, self.d * dx)
    }

    /// Applies a binary rule with both operands differentiable.
    #[inline]
    pub(crate) fn lift2(self, rhs: Self, rule: impl FnOnce(V, V) -> Binary<V>) -> Self {
        let (val, da, db) = rule(self.val, rhs.val);
        // A zero tangent contributes nothing, even where its partial is NaN.
        let d = match (self.d.is_zero(), rhs.d.is_zero()) {
            (true, true) => V::zero(),
            (false, true) => self.d * da,
            (true, false) => rhs.d * db,
            (false, false) => self.d * da + rhs.d * db,
        };
        Self::new(val, d)
    }

    /// Applies a binary rule whose right operand is a constant.
    #[inline]
    pub(crate) fn lift2_lhs(self, rhs: f64, rule: impl FnOnce(V, V) -> Binary<V>) -> Self {
        let (val, da, _) = rule(self.val, V::from_primitive(rhs));
        Self::new(val, self.d * da)
    }

    /// Applies a binary rule whose left operand is a constant.
    #[inline]
    pub(crate) fn lift2_rhs(lhs: f64, rhs: Self, rule: impl FnOnce(V, V) -> Binary<V>) -> Self {
        let (val, _, db) = rule(V::from_primitive(lhs), rhs.val);
        Self::new(val, rhs.d * db)
    }
}

impl<V: Scalar> From<f64> for Fwd<V> {
    fn from(x: f64) -> Self {
        Self::from_primitive(x)
    }
}

impl<V: Scalar> fmt::Display for Fwd<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}ε", self.val, self.d)
    }
}

// Comparisons look at the value only.

impl<V: Scalar> PartialEq for Fwd<V> {
    fn eq(&self, other: &Self) -> bool {
        self.val == other.val
    }
}

impl<V: Scalar> PartialOrd for Fwd<V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.val.partial_cmp(&other.val)
    }
}

impl<V: Scalar> PartialEq<f64> for Fwd<V> {
    fn eq(&self, other: &f64) -> bool {
        self.value_of_rec() == *other
    }
}

impl<V: Scalar> PartialOrd<f64> for Fwd<V> {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.value_of_rec().partial_cmp(other)
    }
}

// Arithmetic

impl<V: Scalar> Add for Fwd<V> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.val + rhs.val, self.d + rhs.d)
    }
}

impl<V: Scalar> Add<f64> for Fwd<V> {
    type Output = Self;
    fn add(self, rhs: f64) -> Self {
        Self::new(self.val + rhs, self.d)
    }
}

impl<V: Scalar> Add<Fwd<V>> for f64 {
    type Output = Fwd<V>;
    fn add(self, rhs: Fwd<V>) -> Fwd<V> {
        Fwd::new(rhs.val + self, rhs.d)
    }
}

impl<V: Scalar> Sub for Fwd<V> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.val - rhs.val, self.d - rhs.d)
    }
}

impl<V: Scalar> Sub<f64> for Fwd<V> {
    type Output = Self;
    fn sub(self, rhs: f64) -> Self {
        Self::new(self.val - rhs, self.d)
    }
}

impl<V: Scalar> Sub<Fwd<V>> for f64 {
    type Output = Fwd<V>;
    fn sub(self, rhs: Fwd<V>) -> Fwd<V> {
        Fwd::new(-rhs.val + self, -rhs.d)
    }
}

impl<V: Scalar> Mul for Fwd<V> {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self::new(self.val * rhs.val, self.d * rhs.val + self.val * rhs.d)
    }
}

impl<V: Scalar> Mul<f64> for Fwd<V> {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.val * rhs, self.d * rhs)
    }
}

impl<V: Scalar> Mul<Fwd<V>> for f64 {
    type Output = Fwd<V>;
    fn mul(self, rhs: Fwd<V>) -> Fwd<V> {
        Fwd::new(rhs.val * self, rhs.d * self)
    }
}

impl<V: Scalar> Div for Fwd<V> {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        Self::new(
            self.val / rhs.val,
            (self.d * rhs.val - self.val * rhs.d) / (rhs.val * rhs.val),
        )
    }
}

impl<V: Scalar> Div<f64> for Fwd<V> {
    type Output = Self;
    fn div(self, rhs: f64) -> Self {
        Self::new(self.val / rhs, self.d / rhs)
    }
}

impl<V: Scalar> Div<Fwd<V>> for f64 {
    type Output = Fwd<V>;
    fn div(self, rhs: Fwd<V>) -> Fwd<V> {
        Fwd::new(
            V::from_primitive(self) / rhs.val,
            -(rhs.d * self) / (rhs.val * rhs.val),
        )
    }
}

impl<V: Scalar> Rem for Fwd<V> {
    type Output = Self;
    fn rem(self, rhs: Self) -> Self {
        self.lift2(rhs, rules::fmod)
    }
}

impl<V: Scalar> Rem<f64> for Fwd<V> {
    type Output = Self;
    fn rem(self, rhs: f64) -> Self {
        self.lift2_lhs(rhs, rules::fmod)
    }
}

impl<V: Scalar> Rem<Fwd<V>> for f64 {
    type Output = Fwd<V>;
    fn rem(self, rhs: Fwd<V>) -> Fwd<V> {
        Fwd::lift2_rhs(self, rhs, rules::fmod)
    }
}

impl<V: Scalar> Neg for Fwd<V> {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.val, -self.d)
    }
}

macro_rules! assign_ops {
    ($($Trait:ident :: $method:ident => $op:tt),* $(,)?) => {
        $(
            impl<V: Scalar> $Trait for Fwd<V> {
                fn $method(&mut self, rhs: Self) {
                    *self = *self $op rhs;
                }
            }

            impl<V: Scalar> $Trait<f64> for Fwd<V> {
                fn $method(&mut self, rhs: f64) {
                    *self = *self $op rhs;
                }
            }
        )*
    };
}

assign_ops! {
    AddAssign::add_assign => +,
    SubAssign::sub_assign => -,
    MulAssign::mul_assign => *,
    DivAssign::div_assign => /,
    RemAssign::rem_assign => %,
}

impl<V: Scalar> Sum for Fwd<V> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, x| acc + x)
    }
}

impl<'a, V: Scalar> Sum<&'a Fwd<V>> for Fwd<V> {
    fn sum<I: Iterator<Item = &'a Fwd<V>>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl<V: Scalar> Product for Fwd<V> {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::from_primitive(1.0), |acc, x| acc * x)
    }
}

impl<'a, V: Scalar> Product<&'a Fwd<V>> for Fwd<V> {
    fn product<I: Iterator<Item = &'a Fwd<V>>>(iter: I) -> Self {
        iter.copied().product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Float;

    type F1 = Fwd<f64>;
    type F2 = Fwd<Fwd<f64>>;
    type F3 = Fwd<Fwd<Fwd<f64>>>;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-8,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn subtracting_a_constant_keeps_the_tangent() {
        let x = F1::new(2.0, 1.0);
        let y = x - 2.0;
        assert_eq!(y.val, 0.0);
        assert_eq!(y.d, 1.0);

        let z = 2.0 - x;
        assert_eq!(z.val, 0.0);
        assert_eq!(z.d, -1.0);
    }

    #[test]
    fn product_and_quotient_rules() {
        let x = F1::new(0.5, 1.0);
        let y = F1::new(0.4, 2.0);

        let p = x * y;
        assert_close(p.val, 0.2);
        assert_close(p.d, 0.4 + 0.5 * 2.0);

        let q = x / y;
        assert_close(q.val, 1.25);
        assert_close(q.d, (1.0 * 0.4 - 0.5 * 2.0) / 0.16);

        let r = 2.0 / x;
        assert_close(r.val, 4.0);
        assert_close(r.d, -2.0 / 0.25);

        let s = x / 4.0;
        assert_close(s.d, 0.25);
    }

    #[test]
    fn division_by_zero_propagates_infinity() {
        let x = F1::new(1.0, 1.0);
        let y = x / F1::new(0.0, 0.0);
        assert_eq!(y.val, f64::INFINITY);
        assert!(y.d.is_infinite() || y.d.is_nan());
    }

    #[test]
    fn remainder_uses_truncated_quotient() {
        let a = F1::new(7.5, 1.0);
        let b = F1::new(2.0, 1.0);
        let r = a % b;
        assert_close(r.val, 1.5);
        assert_close(r.d, 1.0 - 3.0);

        let c = 7.5 % F1::new(-2.0, 1.0);
        assert_close(c.val, 1.5);
        assert_close(c.d, 3.0);
    }

    #[test]
    fn compound_assignment_matches_binary_operators() {
        let x = F1::new(1.5, 1.0);
        let mut y = x;
        y += x;
        y *= 2.0;
        y -= 1.0;
        y /= x;
        let expected = ((x + x) * 2.0 - 1.0) / x;
        assert_eq!(y.val, expected.val);
        assert_eq!(y.d, expected.d);
    }

    #[test]
    fn comparisons_ignore_the_tangent() {
        let a = F1::new(1.0, 5.0);
        let b = F1::new(1.0, -3.0);
        assert!(a == b);
        assert!(a <= b && a >= b);
        assert!(a < F1::new(2.0, 0.0));
        assert!(a == 1.0);
        assert!(a > 0.5);
        assert!(F1::nan() != F1::nan());
    }

    #[test]
    fn second_derivative_through_nesting() {
        // f(x) = x^3 at x = 2: f' = 12, f'' = 12
        let x = F2::new(F1::new(2.0, 1.0), F1::new(1.0, 0.0));
        let y = x * x * x;
        assert_close(y.val.val, 8.0);
        assert_close(y.val.d, 12.0);
        assert_close(y.d.val, 12.0);
        assert_close(y.d.d, 12.0);
    }

    #[test]
    fn third_derivative_through_nesting() {
        // f(x) = exp(2x) at x = 0.5: every derivative is 2^k e
        let seed = F3::new(
            F2::new(F1::new(0.5, 1.0), F1::new(1.0, 0.0)),
            F2::new(F1::new(1.0, 0.0), F1::new(0.0, 0.0)),
        );
        let y = (seed * 2.0).exp();
        let e = 1f64.exp();
        assert_close(y.val.val.val, e);
        assert_close(y.val.val.d, 2.0 * e);
        assert_close(y.val.d.d, 4.0 * e);
        assert_close(y.d.d.d, 8.0 * e);
    }

    #[test]
    fn mixed_partial_from_two_seeds() {
        // f(x, y) = x * sin(y): d2f/dxdy = cos(y)
        let x = F2::new(F1::new(0.7, 1.0), F1::new(0.0, 0.0));
        let y = F2::new(F1::new(1.1, 0.0), F1::new(1.0, 0.0));
        let f = x * y.sin();
        assert_close(f.d.d, 1.1f64.cos());
        assert_close(f.val.d, 1.1f64.sin());
    }

    #[test]
    fn sum_and_product_of_iterators() {
        let xs = [F1::new(1.0, 1.0), F1::new(2.0, 0.0), F1::new(3.0, 2.0)];
        let s: F1 = xs.iter().sum();
        assert_eq!((s.val, s.d), (6.0, 3.0));
        let p: F1 = xs.iter().product();
        assert_eq!(p.val, 6.0);
        assert_close(p.d, 1.0 * 6.0 + 2.0 * 2.0);
    }

    #[test]
    fn display_and_serde() {
        let x = F1::new(1.5, -2.0);
        assert_eq!(x.to_string(), "1.5+-2ε");

        let json = serde_json::to_string(&x).expect("serialize");
        let back: F1 = serde_json::from_str(&json).expect("deserialize");
        assert_eq!((back.val, back.d), (1.5, -2.0));
    }

    #[test]
    fn constants_have_zero_tangent_at_every_level() {
        let c: F3 = 2.5.into();
        assert_eq!(c.val.val.val, 2.5);
        assert_eq!(c.d.val.val, 0.0);
        assert_eq!(c.val.d.d, 0.0);
        assert_eq!(F1::default().val, 0.0);
        assert_eq!(F1::variable(3.0).d, 1.0);
    }
}
