//! Derivatives of whole functions.
//!
//! A function to differentiate implements [`ScalarFunction`] (or [`VectorFunction`])
//! with a method generic over the scalar type, so the same definition is evaluated at
//! `f64`, `Fwd<f64>`, `Fwd<Fwd<f64>>`, `Var` or `Fwd<Var>` depending on which
//! functional drives it. Forward-mode functionals take one sweep per input direction;
//! reverse-mode ones record on a tape that lives only for the duration of the call.
//!
//! Matrices follow the usual Jacobian layout: one row per output, one column per input.

use crate::error::{Error, Result};
use crate::fwd::Fwd;
use crate::reverse::{Tape, Var};
use crate::traits::Scalar;
use log::debug;
use nalgebra::DMatrix;

/// `R^n -> R`, evaluable at any scalar type.
pub trait ScalarFunction {
    fn apply<S: Scalar>(&self, x: &[S]) -> S;
}

/// `R^n -> R^m`, evaluable at any scalar type.
pub trait VectorFunction {
    fn apply<S: Scalar>(&self, x: &[S]) -> Vec<S>;
}

fn unit<T: Scalar>(i: usize, k: usize) -> T {
    if i == k {
        T::one()
    } else {
        T::zero()
    }
}

fn check_direction(op: &'static str, x: &[f64], v: &[f64]) -> Result<()> {
    if x.len() != v.len() {
        return Err(Error::size_mismatch(op, (x.len(), 1), (v.len(), 1)));
    }
    Ok(())
}

/// Value and derivative of a univariate function, in one forward sweep.
pub fn derivative<T, F>(f: F, x: T) -> (T, T)
where
    T: Scalar,
    F: FnOnce(Fwd<T>) -> Fwd<T>,
{
    let y = f(Fwd::variable(x));
    (y.val, y.d)
}

/// Value and partial derivative with respect to input `n`.
pub fn partial_derivative<T: Scalar, F: ScalarFunction>(
    f: &F,
    x: &[T],
    n: usize,
) -> Result<(T, T)> {
    if n >= x.len() {
        return Err(Error::IndexOutOfRange {
            op: "partial_derivative",
            index: n,
            size: x.len(),
        });
    }
    let xs: Vec<Fwd<T>> = x
        .iter()
        .enumerate()
        .map(|(k, &xk)| Fwd::new(xk, unit(n, k)))
        .collect();
    let y = f.apply(&xs);
    Ok((y.val, y.d))
}

/// Value and gradient from one forward sweep per input.
pub fn gradient_fwd<T: Scalar, F: ScalarFunction>(f: &F, x: &[T]) -> (T, Vec<T>) {
    debug!("gradient_fwd: {} forward sweeps", x.len());
    let mut fx = None;
    let mut grad = Vec::with_capacity(x.len());
    for i in 0..x.len() {
        let xs: Vec<Fwd<T>> = x
            .iter()
            .enumerate()
            .map(|(k, &xk)| Fwd::new(xk, unit(i, k)))
            .collect();
        let y = f.apply(&xs);
        fx.get_or_insert(y.val);
        grad.push(y.d);
    }
    (fx.unwrap_or_else(|| f.apply(x)), grad)
}

/// Value and gradient from a single reverse sweep.
pub fn gradient<F: ScalarFunction>(f: &F, x: &[f64]) -> (f64, Vec<f64>) {
    let tape = Tape::new();
    let vars = tape.vars(x);
    let y = f.apply(&vars);
    debug!("gradient: recorded {} nodes", tape.len());
    (y.value(), y.grad(&vars))
}

/// Values and Jacobian from one forward sweep per input.
pub fn jacobian_fwd<F: VectorFunction>(f: &F, x: &[f64]) -> (Vec<f64>, DMatrix<f64>) {
    let n = x.len();
    debug!("jacobian_fwd: {n} forward sweeps");
    let mut values = None;
    let mut columns = Vec::with_capacity(n);
    for i in 0..n {
        let xs: Vec<Fwd<f64>> = x
            .iter()
            .enumerate()
            .map(|(k, &xk)| Fwd::new(xk, unit(i, k)))
            .collect();
        let ys = f.apply(&xs);
        values.get_or_insert_with(|| ys.iter().map(|y| y.val).collect::<Vec<_>>());
        columns.push(ys.iter().map(|y| y.d).collect::<Vec<_>>());
    }
    let values = values.unwrap_or_else(|| f.apply(x));
    let jac = DMatrix::from_fn(values.len(), n, |row, col| columns[col][row]);
    (values, jac)
}

/// Values and Jacobian from one reverse sweep per output, all on one tape.
pub fn jacobian<F: VectorFunction>(f: &F, x: &[f64]) -> (Vec<f64>, DMatrix<f64>) {
    let tape = Tape::new();
    let vars = tape.vars(x);
    let ys = f.apply(&vars);
    debug!(
        "jacobian: {} outputs, recorded {} nodes",
        ys.len(),
        tape.len()
    );
    let rows: Vec<Vec<f64>> = ys.iter().map(|y| y.grad(&vars)).collect();
    let jac = DMatrix::from_fn(ys.len(), x.len(), |row, col| rows[row][col]);
    (ys.iter().map(Var::value).collect(), jac)
}

/// Value, gradient and Hessian by forward-over-forward differentiation.
///
/// The Hessian is symmetric, so only the lower triangle is evaluated: `n (n + 1) / 2`
/// sweeps at `Fwd<Fwd<f64>>`.
pub fn hessian_fwd<F: ScalarFunction>(f: &F, x: &[f64]) -> (f64, Vec<f64>, DMatrix<f64>) {
    let n = x.len();
    debug!("hessian_fwd: {} nested sweeps", n * (n + 1) / 2);
    let mut fx = f.apply(x);
    let mut grad = vec![0.0; n];
    let mut hess = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in 0..=i {
            let xs: Vec<Fwd<Fwd<f64>>> = x
                .iter()
                .enumerate()
                .map(|(k, &xk)| {
                    Fwd::new(Fwd::new(xk, unit(j, k)), Fwd::new(unit(i, k), 0.0))
                })
                .collect();
            let y = f.apply(&xs);
            fx = y.val.val;
            grad[i] = y.d.val;
            hess[(i, j)] = y.d.d;
            hess[(j, i)] = y.d.d;
        }
    }
    (fx, grad, hess)
}

/// Value, gradient and Hessian by forward-over-reverse differentiation.
///
/// One forward direction per input; each direction's tangent is swept backwards to give
/// a full Hessian row.
pub fn hessian<F: ScalarFunction>(f: &F, x: &[f64]) -> (f64, Vec<f64>, DMatrix<f64>) {
    let n = x.len();
    debug!("hessian: {n} forward-over-reverse sweeps");
    let mut fx = f.apply(x);
    let mut grad = vec![0.0; n];
    let mut hess = DMatrix::zeros(n, n);
    for i in 0..n {
        let tape = Tape::new();
        let vars = tape.vars(x);
        let xs: Vec<Fwd<Var>> = vars
            .iter()
            .enumerate()
            .map(|(k, &v)| Fwd::new(v, Var::constant(unit(i, k))))
            .collect();
        let y = f.apply(&xs);
        fx = y.val.value();
        grad[i] = y.d.value();
        for (j, h) in y.d.grad(&vars).into_iter().enumerate() {
            hess[(i, j)] = h;
        }
    }
    (fx, grad, hess)
}

/// Value, Hessian and the gradient of every Hessian entry.
///
/// `grad_hess[k][(i, j)]` is the third derivative of `f` with respect to inputs `i`,
/// `j` and `k`. Evaluated at `Fwd<Fwd<Var>>`, one reverse sweep per lower-triangle
/// entry.
pub fn grad_hessian<F: ScalarFunction>(
    f: &F,
    x: &[f64],
) -> (f64, DMatrix<f64>, Vec<DMatrix<f64>>) {
    let n = x.len();
    debug!("grad_hessian: {} nested sweeps", n * (n + 1) / 2);
    let tape = Tape::new();
    let vars = tape.vars(x);
    let zero = Var::constant(0.0);
    let mut fx = f.apply(x);
    let mut hess = DMatrix::zeros(n, n);
    let mut grad_hess = vec![DMatrix::zeros(n, n); n];
    for i in 0..n {
        for j in 0..=i {
            let xs: Vec<Fwd<Fwd<Var>>> = vars
                .iter()
                .enumerate()
                .map(|(k, &v)| {
                    Fwd::new(
                        Fwd::new(v, Var::constant(unit(j, k))),
                        Fwd::new(Var::constant(unit(i, k)), zero),
                    )
                })
                .collect();
            let y = f.apply(&xs);
            fx = y.val.val.value();
            hess[(i, j)] = y.d.d.value();
            hess[(j, i)] = y.d.d.value();
            for (k, g) in y.d.d.grad(&vars).into_iter().enumerate() {
                grad_hess[k][(i, j)] = g;
                grad_hess[k][(j, i)] = g;
            }
        }
    }
    (fx, hess, grad_hess)
}

/// Value and directional derivative `grad f(x) . v`, in one forward sweep.
pub fn gradient_dot_vector<F: ScalarFunction>(
    f: &F,
    x: &[f64],
    v: &[f64],
) -> Result<(f64, f64)> {
    check_direction("gradient_dot_vector", x, v)?;
    let xs: Vec<Fwd<f64>> = x.iter().zip(v).map(|(&xk, &vk)| Fwd::new(xk, vk)).collect();
    let y = f.apply(&xs);
    Ok((y.val, y.d))
}

/// Value and Hessian-vector product `H(x) v`, in one forward-over-reverse sweep.
pub fn hessian_times_vector<F: ScalarFunction>(
    f: &F,
    x: &[f64],
    v: &[f64],
) -> Result<(f64, Vec<f64>)> {
    check_direction("hessian_times_vector", x, v)?;
    let tape = Tape::new();
    let vars = tape.vars(x);
    let xs: Vec<Fwd<Var>> = vars
        .iter()
        .zip(v)
        .map(|(&xk, &vk)| Fwd::new(xk, Var::constant(vk)))
        .collect();
    let y = f.apply(&xs);
    Ok((y.val.value(), y.d.grad(&vars)))
}

/// Gradient of `trace(M H(x))` with respect to `x`.
///
/// Row `n` of `M` becomes the outer tangent of the sweep whose inner tangent is seeded
/// at input `n`; the resulting second-order terms are summed on one tape and swept
/// backwards once.
pub fn grad_tr_mat_times_hessian<F: ScalarFunction>(
    f: &F,
    x: &[f64],
    m: &DMatrix<f64>,
) -> Result<Vec<f64>> {
    let n = x.len();
    if m.nrows() != m.ncols() {
        return Err(Error::NotSquare {
            op: "grad_tr_mat_times_hessian",
            rows: m.nrows(),
            cols: m.ncols(),
        });
    }
    if m.nrows() != n {
        return Err(Error::size_mismatch(
            "grad_tr_mat_times_hessian",
            (m.nrows(), m.ncols()),
            (n, 1),
        ));
    }

    let tape = Tape::new();
    let vars = tape.vars(x);
    let zero = Var::constant(0.0);
    let mut trace = zero;
    for row in 0..n {
        let xs: Vec<Fwd<Fwd<Var>>> = vars
            .iter()
            .enumerate()
            .map(|(k, &v)| {
                Fwd::new(
                    Fwd::new(v, Var::constant(unit(row, k))),
                    Fwd::new(Var::constant(m[(row, k)]), zero),
                )
            })
            .collect();
        trace += f.apply(&xs).d.d;
    }
    debug!("grad_tr_mat_times_hessian: recorded {} nodes", tape.len());
    Ok(trace.grad(&vars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Float;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9 * expected.abs().max(1.0),
            "expected {expected}, got {actual}"
        );
    }

    /// x^2 y + 3 y^2
    struct Poly;

    impl ScalarFunction for Poly {
        fn apply<S: Scalar>(&self, x: &[S]) -> S {
            x[0] * x[0] * x[1] + x[1] * x[1] * 3.0
        }
    }

    /// x^3 y^2 + x y^3 + x y z^3
    struct Cubic;

    impl ScalarFunction for Cubic {
        fn apply<S: Scalar>(&self, x: &[S]) -> S {
            let (a, b, c) = (x[0], x[1], x[2]);
            a * a * a * b * b + b * b * b * a + c * c * c * b * a
        }
    }

    /// (x, y) -> (2x, 3xy)
    struct Pair;

    impl VectorFunction for Pair {
        fn apply<S: Scalar>(&self, x: &[S]) -> Vec<S> {
            vec![x[0] + x[0], x[0] * x[1] * 3.0]
        }
    }

    /// Log density of a normal in (y, mu, sigma).
    struct NormalLogDensity;

    impl ScalarFunction for NormalLogDensity {
        fn apply<S: Scalar>(&self, x: &[S]) -> S {
            let z = (x[0] - x[1]) / x[2];
            -(z * z) * 0.5 - x[2].ln() - 0.5 * (2.0 * std::f64::consts::PI).ln()
        }
    }

    #[test]
    fn univariate_derivative() {
        let (fx, d) = derivative(|x: Fwd<f64>| x * x * x * 5.0, 7.0);
        assert_close(fx, 5.0 * 343.0);
        assert_close(d, 15.0 * 49.0);

        // Nested: second derivative of x^3 at 2.
        let (fx, d) = derivative(|x: Fwd<Fwd<f64>>| x.powi(3), Fwd::variable(2.0));
        assert_close(fx.val, 8.0);
        assert_close(d.val, 12.0);
        assert_close(d.d, 12.0);
    }

    #[test]
    fn partial_derivatives() {
        let x = [5.0, 7.0];
        let (fx, d) = partial_derivative(&Poly, &x, 0).expect("index in range");
        assert_close(fx, 25.0 * 7.0 + 3.0 * 49.0);
        assert_close(d, 70.0);
        let (_, d) = partial_derivative(&Poly, &x, 1).expect("index in range");
        assert_close(d, 25.0 + 42.0);

        let err = partial_derivative(&Poly, &x, 2).expect_err("out of range");
        assert!(!err.is_domain_error());
    }

    #[test]
    fn forward_and_reverse_gradients_agree() {
        let x = [5.0, 7.0];
        let (fx, grad) = gradient(&Poly, &x);
        assert_close(fx, 322.0);
        assert_close(grad[0], 70.0);
        assert_close(grad[1], 67.0);

        let (fx_fwd, grad_fwd) = gradient_fwd(&Poly, &x);
        assert_eq!(fx_fwd, fx);
        assert_eq!(grad_fwd, grad);
    }

    #[test]
    fn gradient_of_no_inputs() {
        struct Constant;
        impl ScalarFunction for Constant {
            fn apply<S: Scalar>(&self, _: &[S]) -> S {
                S::from_primitive(4.0)
            }
        }
        let empty: [f64; 0] = [];
        assert_eq!(gradient(&Constant, &empty), (4.0, vec![]));
        assert_eq!(gradient_fwd(&Constant, &empty), (4.0, vec![]));
    }

    #[test]
    fn jacobians_put_outputs_in_rows() {
        let x = [2.0, -3.0];
        for (values, jac) in [jacobian(&Pair, &x), jacobian_fwd(&Pair, &x)] {
            assert_eq!(values, vec![4.0, -18.0]);
            assert_eq!(jac.shape(), (2, 2));
            assert_close(jac[(0, 0)], 2.0);
            assert_close(jac[(0, 1)], 0.0);
            assert_close(jac[(1, 0)], -9.0);
            assert_close(jac[(1, 1)], 6.0);
        }
    }

    #[test]
    fn hessians_of_a_polynomial() {
        let x = [5.0, 7.0];
        for (fx, grad, hess) in [hessian(&Poly, &x), hessian_fwd(&Poly, &x)] {
            assert_close(fx, 322.0);
            assert_close(grad[0], 70.0);
            assert_close(grad[1], 67.0);
            assert_close(hess[(0, 0)], 14.0);
            assert_close(hess[(0, 1)], 10.0);
            assert_close(hess[(1, 0)], 10.0);
            assert_close(hess[(1, 1)], 6.0);
        }
    }

    #[test]
    fn hessian_of_a_normal_log_density() {
        let x = [0.7, 0.5, 0.9];
        let (_, _, hess) = hessian(&NormalLogDensity, &x);
        let (_, _, hess_fwd) = hessian_fwd(&NormalLogDensity, &x);

        let inv_sigma_sq = 1.0 / (0.9 * 0.9);
        let diff = 0.2;
        let h13 = 2.0 * diff * inv_sigma_sq / 0.9;
        let h33 = inv_sigma_sq - 3.0 * inv_sigma_sq * inv_sigma_sq * diff * diff;
        let expected = [
            [-inv_sigma_sq, inv_sigma_sq, h13],
            [inv_sigma_sq, -inv_sigma_sq, -h13],
            [h13, -h13, h33],
        ];
        for i in 0..3 {
            for j in 0..3 {
                assert_close(hess[(i, j)], expected[i][j]);
                assert_close(hess_fwd[(i, j)], expected[i][j]);
            }
        }
    }

    #[test]
    fn third_derivatives_of_a_cubic() {
        let x = [1.5, 7.1, 3.1];
        let (fx, hess, grad_hess) = grad_hessian(&Cubic, &x);
        let (a, b, c) = (x[0], x[1], x[2]);
        assert_close(fx, Cubic.apply(&x));

        let f_ab = 6.0 * a * a * b + 3.0 * b * b + c * c * c;
        assert_close(hess[(0, 0)], 6.0 * a * b * b);
        assert_close(hess[(0, 1)], f_ab);
        assert_close(hess[(2, 2)], 6.0 * a * b * c);

        let expected_a = [
            [6.0 * b * b, 12.0 * a * b, 0.0],
            [12.0 * a * b, 6.0 * a * a + 6.0 * b, 3.0 * c * c],
            [0.0, 3.0 * c * c, 6.0 * c * b],
        ];
        let expected_c = [
            [0.0, 3.0 * c * c, 6.0 * c * b],
            [3.0 * c * c, 0.0, 6.0 * c * a],
            [6.0 * c * b, 6.0 * c * a, 6.0 * a * b],
        ];
        for i in 0..3 {
            for j in 0..3 {
                assert_close(grad_hess[0][(i, j)], expected_a[i][j]);
                assert_close(grad_hess[2][(i, j)], expected_c[i][j]);
            }
        }
        assert_close(grad_hess[1][(1, 1)], 6.0 * a);
    }

    #[test]
    fn directional_products() {
        let x = [5.0, 7.0];
        let v = [11.0, 13.0];
        let (fx, dot) = gradient_dot_vector(&Poly, &x, &v).expect("same length");
        assert_close(fx, 322.0);
        assert_close(dot, 70.0 * 11.0 + 67.0 * 13.0);

        let x = [2.0, -3.0];
        let v = [8.0, 5.0];
        let (fx, hv) = hessian_times_vector(&Poly, &x, &v).expect("same length");
        assert_close(fx, 4.0 * -3.0 + 27.0);
        assert_close(hv[0], 2.0 * -3.0 * 8.0 + 2.0 * 2.0 * 5.0);
        assert_close(hv[1], 2.0 * 2.0 * 8.0 + 6.0 * 5.0);

        let err = hessian_times_vector(&Poly, &x, &[1.0]).expect_err("short direction");
        assert!(matches!(err, Error::SizeMismatch { .. }));
    }

    #[test]
    fn gradient_of_trace_of_matrix_times_hessian() {
        let m = DMatrix::from_row_slice(2, 2, &[11.0, 13.0, 17.0, 23.0]);
        let g = grad_tr_mat_times_hessian(&Poly, &[5.0, 7.0], &m).expect("conformant");
        assert_eq!(g.len(), 2);
        assert_close(g[0], 60.0);
        assert_close(g[1], 22.0);

        let rect = DMatrix::zeros(2, 3);
        assert!(matches!(
            grad_tr_mat_times_hessian(&Poly, &[5.0, 7.0], &rect),
            Err(Error::NotSquare { .. })
        ));
        assert!(matches!(
            grad_tr_mat_times_hessian(&Poly, &[5.0], &m),
            Err(Error::SizeMismatch { .. })
        ));
    }
}
