//! Fixed-step ODE integration over any [`Scalar`].
//!
//! Integrating with `Fwd` scalars carries the sensitivity of the trajectory to whatever
//! the tangents were seeded on (initial state, parameters captured by the system, the
//! step size) alongside the trajectory itself.

use crate::error::{Error, Result};
use crate::traits::{DynamicalSystem, Scalar, Steppable};
use log::debug;

/// Classic Runge-Kutta 4th order.
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![T::zero(); dim],
            k2: vec![T::zero(); dim],
            k3: vec![T::zero(); dim],
            k4: vec![T::zero(); dim],
            tmp: vec![T::zero(); dim],
        }
    }

    pub fn dimension(&self) -> usize {
        self.tmp.len()
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let t0 = *t;
        let half = dt * 0.5;

        // k1 = f(t, y)
        system.apply(t0, state, &mut self.k1);

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + half * self.k1[i];
        }
        system.apply(t0 + half, &self.tmp, &mut self.k2);

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + half * self.k2[i];
        }
        system.apply(t0 + half, &self.tmp, &mut self.k3);

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k4);

        // y += dt/6 * (k1 + 2k2 + 2k3 + k4)
        let sixth = dt / 6.0;
        for i in 0..state.len() {
            state[i] += sixth * (self.k1[i] + (self.k2[i] + self.k3[i]) * 2.0 + self.k4[i]);
        }

        *t = t0 + dt;
    }
}

/// Advances `state` by `steps` RK4 steps of size `dt` from `t0`, returning the final time.
pub fn integrate<T: Scalar>(
    system: &impl DynamicalSystem<T>,
    t0: T,
    state: &mut [T],
    dt: T,
    steps: usize,
) -> Result<T> {
    let dim = system.dimension();
    if state.len() != dim {
        return Err(Error::size_mismatch(
            "integrate",
            (dim, 1),
            (state.len(), 1),
        ));
    }
    debug!("integrate: {steps} RK4 steps of {dt} in dimension {dim}");

    let mut solver = RK4::new(dim);
    let mut t = t0;
    for _ in 0..steps {
        solver.step(system, &mut t, state, dt);
    }
    Ok(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fwd::Fwd;

    /// dx/dt = -k x
    struct Decay<T> {
        k: T,
    }

    impl<T: Scalar> DynamicalSystem<T> for Decay<T> {
        fn dimension(&self) -> usize {
            1
        }

        fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
            out[0] = -self.k * x[0];
        }
    }

    /// Harmonic oscillator, x'' = -x.
    struct Oscillator;

    impl<T: Scalar> DynamicalSystem<T> for Oscillator {
        fn dimension(&self) -> usize {
            2
        }

        fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
            out[0] = x[1];
            out[1] = -x[0];
        }
    }

    #[test_log::test]
    fn rk4_tracks_exponential_decay() {
        let system = Decay { k: 0.5 };
        let mut state = [2.0];
        let t = integrate(&system, 0.0, &mut state, 0.01, 200).expect("dimension matches");
        assert!((t - 2.0).abs() < 1e-12);
        assert!((state[0] - 2.0 * (-1.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn parameter_sensitivity_through_forward_mode() {
        let k = 0.5;
        let x0 = 2.0;
        let horizon = 2.0;
        let system = Decay {
            k: Fwd::variable(k),
        };
        let mut state = [Fwd::constant(x0)];
        integrate(
            &system,
            Fwd::constant(0.0),
            &mut state,
            Fwd::constant(0.01),
            200,
        )
        .expect("dimension matches");

        let exact = x0 * (-k * horizon).exp();
        assert!((state[0].val - exact).abs() < 1e-9);
        assert!((state[0].d - (-horizon * exact)).abs() < 1e-8);
    }

    #[test]
    fn initial_condition_sensitivity_is_the_flow_jacobian() {
        // d x(T) / d x0 for the oscillator is the rotation matrix.
        let mut state = [Fwd::variable(1.0), Fwd::constant(0.0)];
        let t = integrate(
            &Oscillator,
            Fwd::constant(0.0),
            &mut state,
            Fwd::constant(0.001),
            1000,
        )
        .expect("dimension matches");
        assert!((t.val - 1.0).abs() < 1e-12);
        assert!((state[0].d - 1f64.cos()).abs() < 1e-10);
        assert!((state[1].d + 1f64.sin()).abs() < 1e-10);
    }

    #[test]
    fn zero_steps_leave_the_state_alone() {
        let mut state = [1.0, 2.0];
        let t = integrate(&Oscillator, 3.0, &mut state, 0.1, 0).expect("dimension matches");
        assert_eq!(t, 3.0);
        assert_eq!(state, [1.0, 2.0]);
    }

    #[test]
    fn state_of_the_wrong_size_is_rejected() {
        let mut state = [1.0];
        let err = integrate(&Oscillator, 0.0, &mut state, 0.1, 1).expect_err("wrong size");
        assert!(matches!(err, Error::SizeMismatch { op: "integrate", .. }));
    }
}
