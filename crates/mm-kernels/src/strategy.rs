use std::fmt::Debug;

use crate::error::{MatmulError, Result};
use crate::matrix::Matrix;

/// How a strategy combines its product with the existing contents of `C`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// `C = A @ B`. Prior contents of `C` are ignored.
    #[default]
    Overwrite,
    /// `C += A @ B`.
    Accumulate,
}

/// A matrix multiplication strategy.
///
/// Every implementation reads only from `a` and `b` and writes only to `c`.
/// Shapes are validated before `c` is touched, so a returned error always
/// leaves the output unchanged.
pub trait MatMul: Send + Sync + Debug {
    /// Registry name of this strategy (e.g. "blocked", "simd").
    fn name(&self) -> &str;

    /// Multiply `a` (m x k) by `b` (k x n) into `c` (m x n) using `mode`.
    fn multiply_with(&self, a: &Matrix, b: &Matrix, c: &mut Matrix, mode: OutputMode) -> Result<()>;

    /// `C = A @ B`.
    fn multiply(&self, a: &Matrix, b: &Matrix, c: &mut Matrix) -> Result<()> {
        self.multiply_with(a, b, c, OutputMode::Overwrite)
    }

    /// `C += A @ B`.
    fn multiply_accumulate(&self, a: &Matrix, b: &Matrix, c: &mut Matrix) -> Result<()> {
        self.multiply_with(a, b, c, OutputMode::Accumulate)
    }
}

/// Dimensions of a validated product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims {
    pub m: usize,
    pub k: usize,
    pub n: usize,
}

/// Check that `a` is m x k, `b` is k x n and `c` is m x n.
pub fn check_shapes(a: &Matrix, b: &Matrix, c: &Matrix) -> Result<Dims> {
    let (m, k) = a.shape();
    let (k2, n) = b.shape();
    if k != k2 || c.shape() != (m, n) {
        return Err(MatmulError::ShapeMismatch {
            a: a.shape(),
            b: b.shape(),
            c: c.shape(),
        });
    }
    Ok(Dims { m, k, n })
}

/// Store a fully computed product into `c` according to `mode`.
pub(crate) fn store(c: &mut [f32], product: &[f32], mode: OutputMode) {
    debug_assert_eq!(c.len(), product.len());
    match mode {
        OutputMode::Overwrite => c.copy_from_slice(product),
        OutputMode::Accumulate => {
            for (dst, src) in c.iter_mut().zip(product) {
                *dst += src;
            }
        }
    }
}

impl Matrix {
    /// Compute `self @ other` into a new matrix using `strategy`.
    pub fn matmul(&self, other: &Matrix, strategy: &dyn MatMul) -> Result<Matrix> {
        if self.cols() != other.rows() {
            return Err(MatmulError::ShapeMismatch {
                a: self.shape(),
                b: other.shape(),
                c: (self.rows(), other.cols()),
            });
        }
        let mut out = Matrix::new(self.rows(), other.cols());
        strategy.multiply(self, other, &mut out)?;
        Ok(out)
    }
}
