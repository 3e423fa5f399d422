//! Dense containers of differentiable scalars.
//!
//! Everything is generic over the scalar type, so the same call differentiates through
//! `Fwd<f64>`, `Fwd<Fwd<f64>>` or `Fwd<Var>`. Matrices are `nalgebra` dense matrices
//! (vectors are `n x 1` matrices); reductions take plain slices, which also covers
//! scalars that borrow a tape. Shapes are checked up front and reported as
//! [`Error::SizeMismatch`].

use crate::error::{Error, Result};
use crate::fwd::Fwd;
use crate::traits::Scalar;
use log::warn;
use nalgebra::{DMatrix, DVector, RowDVector};

fn shape<S: Scalar + 'static>(m: &DMatrix<S>) -> (usize, usize) {
    (m.nrows(), m.ncols())
}

fn check_same_shape<S: Scalar + 'static>(
    op: &'static str,
    a: &DMatrix<S>,
    b: &DMatrix<S>,
) -> Result<()> {
    if shape(a) != shape(b) {
        return Err(Error::size_mismatch(op, shape(a), shape(b)));
    }
    Ok(())
}

fn check_square<S: Scalar + 'static>(op: &'static str, a: &DMatrix<S>) -> Result<()> {
    if a.nrows() != a.ncols() {
        return Err(Error::NotSquare {
            op,
            rows: a.nrows(),
            cols: a.ncols(),
        });
    }
    Ok(())
}

fn check_same_len<S>(op: &'static str, a: &[S], b: &[S]) -> Result<()> {
    if a.len() != b.len() {
        return Err(Error::size_mismatch(op, (a.len(), 1), (b.len(), 1)));
    }
    Ok(())
}

fn dot<'a, S: Scalar + 'a>(
    xs: impl Iterator<Item = &'a S>,
    ys: impl Iterator<Item = &'a S>,
) -> S {
    xs.zip(ys).fold(S::zero(), |acc, (&x, &y)| acc + x * y)
}

// Elementwise

pub fn add<S: Scalar + 'static>(a: &DMatrix<S>, b: &DMatrix<S>) -> Result<DMatrix<S>> {
    check_same_shape("add", a, b)?;
    Ok(a.zip_map(b, |x, y| x + y))
}

pub fn subtract<S: Scalar + 'static>(a: &DMatrix<S>, b: &DMatrix<S>) -> Result<DMatrix<S>> {
    check_same_shape("subtract", a, b)?;
    Ok(a.zip_map(b, |x, y| x - y))
}

pub fn minus<S: Scalar + 'static>(a: &DMatrix<S>) -> DMatrix<S> {
    a.map(|x| -x)
}

pub fn elt_multiply<S: Scalar + 'static>(a: &DMatrix<S>, b: &DMatrix<S>) -> Result<DMatrix<S>> {
    check_same_shape("elt_multiply", a, b)?;
    Ok(a.zip_map(b, |x, y| x * y))
}

pub fn elt_divide<S: Scalar + 'static>(a: &DMatrix<S>, b: &DMatrix<S>) -> Result<DMatrix<S>> {
    check_same_shape("elt_divide", a, b)?;
    Ok(a.zip_map(b, |x, y| x / y))
}

pub fn multiply_scalar<S: Scalar + 'static>(a: &DMatrix<S>, c: S) -> DMatrix<S> {
    a.map(|x| x * c)
}

pub fn divide<S: Scalar + 'static>(a: &DMatrix<S>, c: S) -> DMatrix<S> {
    a.map(|x| x / c)
}

pub fn exp<S: Scalar + 'static>(a: &DMatrix<S>) -> DMatrix<S> {
    a.map(|x| x.exp())
}

pub fn log<S: Scalar + 'static>(a: &DMatrix<S>) -> DMatrix<S> {
    a.map(|x| x.ln())
}

// Products

pub fn transpose<S: Scalar + 'static>(a: &DMatrix<S>) -> DMatrix<S> {
    a.transpose()
}

pub fn multiply<S: Scalar + 'static>(a: &DMatrix<S>, b: &DMatrix<S>) -> Result<DMatrix<S>> {
    if a.ncols() != b.nrows() {
        return Err(Error::size_mismatch("multiply", shape(a), shape(b)));
    }
    Ok(DMatrix::from_fn(a.nrows(), b.ncols(), |i, j| {
        dot(a.row(i).iter(), b.column(j).iter())
    }))
}

pub fn dot_product<S: Scalar>(a: &[S], b: &[S]) -> Result<S> {
    check_same_len("dot_product", a, b)?;
    Ok(dot(a.iter(), b.iter()))
}

/// Dot product of each pair of matching columns.
pub fn columns_dot_product<S: Scalar + 'static>(
    a: &DMatrix<S>,
    b: &DMatrix<S>,
) -> Result<RowDVector<S>> {
    check_same_shape("columns_dot_product", a, b)?;
    let dots = (0..a.ncols())
        .map(|j| dot(a.column(j).iter(), b.column(j).iter()))
        .collect();
    Ok(RowDVector::from_vec(dots))
}

/// Dot product of each pair of matching rows.
pub fn rows_dot_product<S: Scalar + 'static>(
    a: &DMatrix<S>,
    b: &DMatrix<S>,
) -> Result<DVector<S>> {
    check_same_shape("rows_dot_product", a, b)?;
    let dots = (0..a.nrows())
        .map(|i| dot(a.row(i).iter(), b.row(i).iter()))
        .collect();
    Ok(DVector::from_vec(dots))
}

/// `A^T A`.
pub fn crossprod<S: Scalar + 'static>(a: &DMatrix<S>) -> DMatrix<S> {
    DMatrix::from_fn(a.ncols(), a.ncols(), |i, j| {
        dot(a.column(i).iter(), a.column(j).iter())
    })
}

/// `A A^T`.
pub fn tcrossprod<S: Scalar + 'static>(a: &DMatrix<S>) -> DMatrix<S> {
    DMatrix::from_fn(a.nrows(), a.nrows(), |i, j| {
        dot(a.row(i).iter(), a.row(j).iter())
    })
}

/// `L L^T` using only the lower triangle of `l`.
pub fn multiply_lower_tri_self_transpose<S: Scalar + 'static>(l: &DMatrix<S>) -> DMatrix<S> {
    let lower = DMatrix::from_fn(l.nrows(), l.ncols(), |i, j| {
        if j <= i {
            l[(i, j)]
        } else {
            S::zero()
        }
    });
    tcrossprod(&lower)
}

/// `diag(v) M`.
pub fn diag_pre_multiply<S: Scalar + 'static>(v: &[S], m: &DMatrix<S>) -> Result<DMatrix<S>> {
    if v.len() != m.nrows() {
        return Err(Error::size_mismatch(
            "diag_pre_multiply",
            (v.len(), 1),
            shape(m),
        ));
    }
    Ok(DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| v[i] * m[(i, j)]))
}

/// `M diag(v)`.
pub fn diag_post_multiply<S: Scalar + 'static>(m: &DMatrix<S>, v: &[S]) -> Result<DMatrix<S>> {
    if v.len() != m.ncols() {
        return Err(Error::size_mismatch(
            "diag_post_multiply",
            shape(m),
            (v.len(), 1),
        ));
    }
    Ok(DMatrix::from_fn(m.nrows(), m.ncols(), |i, j| m[(i, j)] * v[j]))
}

/// `B^T A B` for square `A`.
pub fn quad_form<S: Scalar + 'static>(a: &DMatrix<S>, b: &DMatrix<S>) -> Result<DMatrix<S>> {
    check_square("quad_form", a)?;
    if a.ncols() != b.nrows() {
        return Err(Error::size_mismatch("quad_form", shape(a), shape(b)));
    }
    let ab = multiply(a, b)?;
    Ok(DMatrix::from_fn(b.ncols(), b.ncols(), |i, j| {
        dot(b.column(i).iter(), ab.column(j).iter())
    }))
}

// Solves

/// Gaussian elimination with partial pivoting on the primitive values.
fn solve<S: Scalar + 'static>(
    op: &'static str,
    a: &DMatrix<S>,
    b: &DMatrix<S>,
) -> Result<DMatrix<S>> {
    check_square(op, a)?;
    if a.nrows() != b.nrows() {
        return Err(Error::size_mismatch(op, shape(a), shape(b)));
    }

    let n = a.nrows();
    let scale = a
        .iter()
        .map(|x| x.value_of_rec().abs())
        .fold(0.0, f64::max);
    let mut lu = a.clone();
    let mut x = b.clone();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| {
                let pi = lu[(i, col)].value_of_rec().abs();
                let pj = lu[(j, col)].value_of_rec().abs();
                pi.total_cmp(&pj)
            })
            .unwrap_or(col);
        let magnitude = lu[(pivot, col)].value_of_rec().abs();
        if magnitude == 0.0 {
            return Err(Error::Singular { op, column: col });
        }
        if magnitude < scale * 1e-14 {
            warn!("{op}: near-singular pivot {magnitude:e} in column {col}");
        }
        if pivot != col {
            lu.swap_rows(pivot, col);
            x.swap_rows(pivot, col);
        }

        for row in col + 1..n {
            let factor = lu[(row, col)] / lu[(col, col)];
            for k in col..n {
                let t = lu[(col, k)];
                lu[(row, k)] -= factor * t;
            }
            for k in 0..x.ncols() {
                let t = x[(col, k)];
                x[(row, k)] -= factor * t;
            }
        }
    }

    for k in 0..x.ncols() {
        for row in (0..n).rev() {
            let mut acc = x[(row, k)];
            for j in row + 1..n {
                acc -= lu[(row, j)] * x[(j, k)];
            }
            x[(row, k)] = acc / lu[(row, row)];
        }
    }
    Ok(x)
}

/// `A^-1 B`.
pub fn mdivide_left<S: Scalar + 'static>(a: &DMatrix<S>, b: &DMatrix<S>) -> Result<DMatrix<S>> {
    solve("mdivide_left", a, b)
}

/// `B A^-1`.
pub fn mdivide_right<S: Scalar + 'static>(b: &DMatrix<S>, a: &DMatrix<S>) -> Result<DMatrix<S>> {
    check_square("mdivide_right", a)?;
    if b.ncols() != a.nrows() {
        return Err(Error::size_mismatch("mdivide_right", shape(b), shape(a)));
    }
    solve("mdivide_right", &a.transpose(), &b.transpose()).map(|x| x.transpose())
}

/// `L^-1 B` by forward substitution, reading only the lower triangle of `l`.
pub fn mdivide_left_tri_low<S: Scalar + 'static>(
    l: &DMatrix<S>,
    b: &DMatrix<S>,
) -> Result<DMatrix<S>> {
    check_square("mdivide_left_tri_low", l)?;
    if l.nrows() != b.nrows() {
        return Err(Error::size_mismatch(
            "mdivide_left_tri_low",
            shape(l),
            shape(b),
        ));
    }
    let n = l.nrows();
    if let Some(column) = (0..n).find(|&i| l[(i, i)].value_of_rec() == 0.0) {
        return Err(Error::Singular {
            op: "mdivide_left_tri_low",
            column,
        });
    }

    let mut x = b.clone();
    for k in 0..x.ncols() {
        for row in 0..n {
            let mut acc = x[(row, k)];
            for j in 0..row {
                acc -= l[(row, j)] * x[(j, k)];
            }
            x[(row, k)] = acc / l[(row, row)];
        }
    }
    Ok(x)
}

pub fn inverse<S: Scalar + 'static>(a: &DMatrix<S>) -> Result<DMatrix<S>> {
    check_square("inverse", a)?;
    let n = a.nrows();
    let identity = DMatrix::from_fn(n, n, |i, j| if i == j { S::one() } else { S::zero() });
    solve("inverse", a, &identity)
}

// Reductions

pub fn sum<S: Scalar>(xs: &[S]) -> S {
    xs.iter().fold(S::zero(), |acc, &x| acc + x)
}

pub fn prod<S: Scalar>(xs: &[S]) -> S {
    xs.iter().fold(S::one(), |acc, &x| acc * x)
}

pub fn mean<S: Scalar>(xs: &[S]) -> Result<S> {
    if xs.is_empty() {
        return Err(Error::EmptyInput {
            op: "mean",
            required: 1,
            got: 0,
        });
    }
    Ok(sum(xs) / xs.len() as f64)
}

/// Sample variance (divides by `n - 1`).
pub fn variance<S: Scalar>(xs: &[S]) -> Result<S> {
    if xs.len() < 2 {
        return Err(Error::EmptyInput {
            op: "variance",
            required: 2,
            got: xs.len(),
        });
    }
    let m = mean(xs)?;
    let ss = xs.iter().fold(S::zero(), |acc, &x| {
        let dev = x - m;
        acc + dev * dev
    });
    Ok(ss / (xs.len() - 1) as f64)
}

/// Sample standard deviation.
pub fn sd<S: Scalar>(xs: &[S]) -> Result<S> {
    if xs.len() < 2 {
        return Err(Error::EmptyInput {
            op: "sd",
            required: 2,
            got: xs.len(),
        });
    }
    Ok(variance(xs)?.sqrt())
}

/// Smallest element; `+inf` with a zero tangent for an empty slice.
pub fn min<S: Scalar>(xs: &[S]) -> S {
    xs.iter().fold(S::infinity(), |acc, &x| acc.min(x))
}

/// Largest element; `-inf` with a zero tangent for an empty slice.
pub fn max<S: Scalar>(xs: &[S]) -> S {
    xs.iter().fold(S::neg_infinity(), |acc, &x| acc.max(x))
}

/// `ln(sum(exp(x)))`, shifted by the largest value; `-inf` for an empty slice.
pub fn log_sum_exp<S: Scalar>(xs: &[S]) -> S {
    let m = xs
        .iter()
        .map(|x| x.value_of_rec())
        .fold(f64::NEG_INFINITY, f64::max);
    if m.is_infinite() {
        return S::from_primitive(m);
    }
    let total = xs.iter().fold(S::zero(), |acc, &x| acc + (x - m).exp());
    total.ln() + m
}

pub fn squared_distance<S: Scalar>(a: &[S], b: &[S]) -> Result<S> {
    check_same_len("squared_distance", a, b)?;
    Ok(a.iter().zip(b).fold(S::zero(), |acc, (&x, &y)| {
        let diff = x - y;
        acc + diff * diff
    }))
}

/// Euclidean distance; zero for two empty vectors.
pub fn distance<S: Scalar>(a: &[S], b: &[S]) -> Result<S> {
    check_same_len("distance", a, b)?;
    if a.is_empty() {
        return Ok(S::zero());
    }
    Ok(squared_distance(a, b)?.sqrt())
}

// Shaping

/// Stacks `b` below `a`.
pub fn append_row<S: Scalar + 'static>(a: &DMatrix<S>, b: &DMatrix<S>) -> Result<DMatrix<S>> {
    if a.ncols() != b.ncols() {
        return Err(Error::size_mismatch("append_row", shape(a), shape(b)));
    }
    let top = a.nrows();
    Ok(DMatrix::from_fn(top + b.nrows(), a.ncols(), |i, j| {
        if i < top {
            a[(i, j)]
        } else {
            b[(i - top, j)]
        }
    }))
}

/// Places `b` to the right of `a`.
pub fn append_col<S: Scalar + 'static>(a: &DMatrix<S>, b: &DMatrix<S>) -> Result<DMatrix<S>> {
    if a.nrows() != b.nrows() {
        return Err(Error::size_mismatch("append_col", shape(a), shape(b)));
    }
    let left = a.ncols();
    Ok(DMatrix::from_fn(a.nrows(), left + b.ncols(), |i, j| {
        if j < left {
            a[(i, j)]
        } else {
            b[(i, j - left)]
        }
    }))
}

/// The first `n` elements.
pub fn head<S: Scalar>(v: &[S], n: usize) -> Result<Vec<S>> {
    segment_checked("head", v, 0, n)
}

/// The last `n` elements.
pub fn tail<S: Scalar>(v: &[S], n: usize) -> Result<Vec<S>> {
    if n > v.len() {
        return Err(Error::IndexOutOfRange {
            op: "tail",
            index: n,
            size: v.len(),
        });
    }
    Ok(v[v.len() - n..].to_vec())
}

/// `n` elements starting at the zero-based index `start`.
pub fn segment<S: Scalar>(v: &[S], start: usize, n: usize) -> Result<Vec<S>> {
    segment_checked("segment", v, start, n)
}

fn segment_checked<S: Scalar>(
    op: &'static str,
    v: &[S],
    start: usize,
    n: usize,
) -> Result<Vec<S>> {
    let end = start.saturating_add(n);
    if end > v.len() {
        return Err(Error::IndexOutOfRange {
            op,
            index: end,
            size: v.len(),
        });
    }
    Ok(v[start..end].to_vec())
}

pub fn rep_matrix<S: Scalar + 'static>(x: S, rows: usize, cols: usize) -> DMatrix<S> {
    DMatrix::from_element(rows, cols, x)
}

/// Lifts a matrix to dual numbers with zero tangents.
pub fn to_fwd<V: Scalar + 'static>(m: &DMatrix<V>) -> DMatrix<Fwd<V>> {
    m.map(Fwd::constant)
}

/// Pairs a value matrix with a tangent matrix of the same shape.
pub fn to_fwd_with_tangent<V: Scalar + 'static>(
    val: &DMatrix<V>,
    d: &DMatrix<V>,
) -> Result<DMatrix<Fwd<V>>> {
    check_same_shape("to_fwd", val, d)?;
    Ok(val.zip_map(d, Fwd::new))
}

pub fn value_of<V: Scalar + 'static>(m: &DMatrix<Fwd<V>>) -> DMatrix<V> {
    m.map(|x| x.val)
}

pub fn tangent_of<V: Scalar + 'static>(m: &DMatrix<Fwd<V>>) -> DMatrix<V> {
    m.map(|x| x.d)
}
