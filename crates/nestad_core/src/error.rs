use thiserror::Error;

/// Errors raised by the container and functional layers.
///
/// The scalar types never error: degenerate arithmetic propagates as NaN or infinity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{op}: size mismatch, {lhs_rows}x{lhs_cols} vs {rhs_rows}x{rhs_cols}")]
    SizeMismatch {
        op: &'static str,
        lhs_rows: usize,
        lhs_cols: usize,
        rhs_rows: usize,
        rhs_cols: usize,
    },

    #[error("{op}: expecting a square matrix, got {rows}x{cols}")]
    NotSquare {
        op: &'static str,
        rows: usize,
        cols: usize,
    },

    #[error("{op}: needs at least {required} element(s), got {got}")]
    EmptyInput {
        op: &'static str,
        required: usize,
        got: usize,
    },

    #[error("{op}: matrix is singular (zero pivot in column {column})")]
    Singular { op: &'static str, column: usize },

    #[error("{op}: index {index} out of range for size {size}")]
    IndexOutOfRange {
        op: &'static str,
        index: usize,
        size: usize,
    },
}

impl Error {
    /// True for errors about the mathematical domain of the inputs (shapes, emptiness,
    /// singularity), false for plain invalid arguments.
    pub fn is_domain_error(&self) -> bool {
        !matches!(self, Error::IndexOutOfRange { .. })
    }

    pub(crate) fn size_mismatch(
        op: &'static str,
        lhs: (usize, usize),
        rhs: (usize, usize),
    ) -> Self {
        Error::SizeMismatch {
            op,
            lhs_rows: lhs.0,
            lhs_cols: lhs.1,
            rhs_rows: rhs.0,
            rhs_cols: rhs.1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
