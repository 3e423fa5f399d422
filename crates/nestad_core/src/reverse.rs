//! Reverse-mode scalar recorded on an explicit tape.
//!
//! Every operation between [`Var`]s pushes one node holding the local partials of its
//! result with respect to (at most two) parents, taken from the same derivative table
//! as the forward layer. [`Var::grad`] sweeps the tape backwards from an output.
//!
//! ```
//! use nestad_core::reverse::Tape;
//!
//! let tape = Tape::new();
//! let x = tape.var(3.0);
//! let y = x * x + 2.0 * x;
//! assert_eq!(y.value(), 15.0);
//! assert_eq!(y.grad(&[x]), vec![8.0]);
//! ```

mod float;

use crate::rules::{self, Binary, Unary};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::iter::{Product, Sum};
use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};
use std::ptr;

#[derive(Debug, Clone, Copy)]
enum Node {
    /// An independent variable.
    Leaf,
    Unary {
        a: usize,
        da: f64,
    },
    Binary {
        a: usize,
        da: f64,
        b: usize,
        db: f64,
    },
}

/// The recording context for [`Var`].
///
/// Interior mutability lets many `Copy` handles append to one tape; `clear` takes
/// `&mut self`, so no handle can outlive the nodes it points to.
#[derive(Debug, Default)]
pub struct Tape {
    nodes: RefCell<Vec<Node>>,
}

impl Tape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an independent variable.
    pub fn var(&self, value: f64) -> Var<'_> {
        let index = self.push(Node::Leaf);
        Var {
            value,
            slot: Some((self, index)),
        }
    }

    pub fn vars(&self, values: &[f64]) -> Vec<Var<'_>> {
        values.iter().map(|&v| self.var(v)).collect()
    }

    /// Number of recorded nodes.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.get_mut().clear();
    }

    fn push(&self, node: Node) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(node);
        nodes.len() - 1
    }

    fn record<'t>(&'t self, value: f64, node: Node) -> Var<'t> {
        let index = self.push(node);
        Var {
            value,
            slot: Some((self, index)),
        }
    }

    /// Adjoints of every node up to `output`, seeded with 1 at `output`.
    fn adjoints(&self, output: usize) -> Vec<f64> {
        let nodes = self.nodes.borrow();
        let mut adj = vec![0.0; output + 1];
        adj[output] = 1.0;

        for i in (0..=output).rev() {
            let g = adj[i];
            if g == 0.0 {
                continue;
            }
            match nodes[i] {
                Node::Leaf => {}
                Node::Unary { a, da } => adj[a] += g * da,
                Node::Binary { a, da, b, db } => {
                    adj[a] += g * da;
                    adj[b] += g * db;
                }
            }
        }
        adj
    }
}

/// Reverse-mode scalar: a value plus, unless it is a constant, its node on a [`Tape`].
#[derive(Clone, Copy, Default)]
pub struct Var<'t> {
    value: f64,
    slot: Option<(&'t Tape, usize)>,
}

impl<'t> Var<'t> {
    /// A constant. Never recorded, and its adjoint is always zero.
    pub fn constant(value: f64) -> Self {
        Self { value, slot: None }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_constant(&self) -> bool {
        self.slot.is_none()
    }

    /// Gradient of `self` with respect to each of `independents`.
    ///
    /// Each call starts from zeroed adjoints, so it can be repeated for several outputs
    /// recorded on the same tape. Independents the output does not depend on, and
    /// constants, get a zero.
    pub fn grad(&self, independents: &[Var<'t>]) -> Vec<f64> {
        let Some((tape, output)) = self.slot else {
            return vec![0.0; independents.len()];
        };
        let adj = tape.adjoints(output);
        independents
            .iter()
            .map(|x| match x.slot {
                Some((t, i)) if ptr::eq(t, tape) => adj.get(i).copied().unwrap_or(0.0),
                _ => 0.0,
            })
            .collect()
    }

    #[inline]
    pub(crate) fn unary(self, rule: impl FnOnce(f64) -> Unary<f64>) -> Self {
        let (value, da) = rule(self.value);
        match self.slot {
            None => Var::constant(value),
            Some((tape, a)) => tape.record(value, Node::Unary { a, da }),
        }
    }

    #[inline]
    pub(crate) fn binary(self, rhs: Self, rule: impl FnOnce(f64, f64) -> Binary<f64>) -> Self {
        let (value, da, db) = rule(self.value, rhs.value);
        match (self.slot, rhs.slot) {
            (None, None) => Var::constant(value),
            (Some((tape, a)), None) => tape.record(value, Node::Unary { a, da }),
            (None, Some((tape, b))) => tape.record(value, Node::Unary { a: b, da: db }),
            (Some((tape, a)), Some((other, b))) => {
                debug_assert!(ptr::eq(tape, other), "operands recorded on different tapes");
                tape.record(value, Node::Binary { a, da, b, db })
            }
        }
    }
}

impl From<f64> for Var<'_> {
    fn from(x: f64) -> Self {
        Var::constant(x)
    }
}

impl fmt::Debug for Var<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Var")
            .field("value", &self.value)
            .field("index", &self.slot.map(|(_, i)| i))
            .finish()
    }
}

impl fmt::Display for Var<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}

impl PartialEq for Var<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialOrd for Var<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl PartialEq<f64> for Var<'_> {
    fn eq(&self, other: &f64) -> bool {
        self.value == *other
    }
}

impl PartialOrd<f64> for Var<'_> {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.value.partial_cmp(other)
    }
}

// Operators. The rule's partials are recorded for whichever operands live on a tape.

macro_rules! binary_ops {
    ($($Trait:ident :: $method:ident => $rule:path),* $(,)?) => {
        $(
            impl<'t> $Trait for Var<'t> {
                type Output = Self;
                fn $method(self, rhs: Self) -> Self {
                    self.binary(rhs, $rule)
                }
            }

            impl<'t> $Trait<f64> for Var<'t> {
                type Output = Self;
                fn $method(self, rhs: f64) -> Self {
                    self.binary(Var::constant(rhs), $rule)
                }
            }

            impl<'t> $Trait<Var<'t>> for f64 {
                type Output = Var<'t>;
                fn $method(self, rhs: Var<'t>) -> Var<'t> {
                    Var::constant(self).binary(rhs, $rule)
                }
            }
        )*
    };
}

binary_ops! {
    Add::add => rules::add,
    Sub::sub => rules::sub,
    Mul::mul => rules::mul,
    Div::div => rules::div,
    Rem::rem => rules::fmod,
}

impl Neg for Var<'_> {
    type Output = Self;
    fn neg(self) -> Self {
        self.unary(|a| (-a, -1.0))
    }
}

macro_rules! assign_ops {
    ($($Trait:ident :: $method:ident => $op:tt),* $(,)?) => {
        $(
            impl $Trait for Var<'_> {
                fn $method(&mut self, rhs: Self) {
                    *self = *self $op rhs;
                }
            }

            impl $Trait<f64> for Var<'_> {
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

impl<'t> Sum for Var<'t> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Var::constant(0.0), |acc, x| acc + x)
    }
}

impl<'a, 't> Sum<&'a Var<'t>> for Var<'t> {
    fn sum<I: Iterator<Item = &'a Var<'t>>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl<'t> Product for Var<'t> {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Var::constant(1.0), |acc, x| acc * x)
    }
}
