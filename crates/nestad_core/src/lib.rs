//! The `nestad_core` crate provides nested forward-mode automatic differentiation,
//! with a reverse-mode tape to drive it from the outside.
//! Every function is written once, generic over [`Scalar`], and differentiates at any
//! order by nesting dual numbers.
//!
//! Key components:
//! - **Traits**: `Scalar` (the value domain), `DynamicalSystem` and `Steppable` (ODEs).
//! - **Fwd**: the dual number `Fwd<V>`, nestable as `Fwd<Fwd<f64>>`, `Fwd<Var>`, ...
//! - **Reverse**: `Tape` and its handle `Var` for reverse sweeps.
//! - **Rules / Functions**: the derivative table and the named functions built on it.
//! - **Matrix**: dense containers, products, solves and reductions over any scalar.
//! - **Functional**: gradients, Jacobians, Hessians and their products.
//! - **Check**: finite-difference gradient checking.
//! - **Solvers**: RK4 integration, with forward-mode sensitivities for free.
pub mod check;
pub mod error;
pub mod functional;
pub mod functions;
pub mod fwd;
pub mod matrix;
pub mod reverse;
pub mod rules;
pub mod solvers;
pub mod special;
pub mod traits;

pub use error::{Error, Result};
pub use fwd::Fwd;
pub use reverse::{Tape, Var};
pub use traits::Scalar;
