use std::fmt;
use std::ops::{Index, IndexMut};

use crate::error::{MatmulError, Result};

/// Dense, row-major f32 matrix.
///
/// Element `(i, j)` lives at offset `i * cols + j` of the backing vector,
/// whose length is always `rows * cols`. A matrix is never resized after
/// construction; strategies only ever write through `IndexMut` or
/// [`Matrix::as_mut_slice`].
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Create a zero-filled `rows x cols` matrix.
    ///
    /// # Panics
    /// Panics if either dimension is zero.
    pub fn new(rows: usize, cols: usize) -> Self {
        assert!(
            rows > 0 && cols > 0,
            "matrix dimensions must be positive, got {}x{}",
            rows,
            cols
        );
        Matrix {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Wrap existing row-major data.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if rows == 0 || cols == 0 || data.len() != rows * cols {
            return Err(MatmulError::InvalidDimensions {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Matrix { data, rows, cols })
    }

    /// The `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Matrix::new(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Row `i` as a contiguous slice.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    pub fn zero(&mut self) {
        self.fill(0.0);
    }

    /// Returns `selfᵀ` in freshly allocated storage.
    pub fn transpose(&self) -> Matrix {
        let mut t = Matrix::new(self.cols, self.rows);
        transpose_into(&self.data, &mut t.data, self.rows, self.cols);
        t
    }

    /// Copy out the `rows x cols` block starting at `(row_off, col_off)`.
    pub fn submatrix(&self, row_off: usize, col_off: usize, rows: usize, cols: usize) -> Matrix {
        let mut sub = Matrix::new(rows, cols);
        for i in 0..rows {
            let src = (row_off + i) * self.cols + col_off;
            sub.data[i * cols..(i + 1) * cols].copy_from_slice(&self.data[src..src + cols]);
        }
        sub
    }

    /// Write `sub` into this matrix with its top-left corner at `(row_off, col_off)`.
    pub fn set_submatrix(&mut self, sub: &Matrix, row_off: usize, col_off: usize) {
        for i in 0..sub.rows {
            let dst = (row_off + i) * self.cols + col_off;
            self.data[dst..dst + sub.cols].copy_from_slice(sub.row(i));
        }
    }

    /// Zero-padded `side x side` copy with this matrix in the top-left corner.
    ///
    /// # Panics
    /// Panics if `side` is smaller than either dimension.
    pub fn padded(&self, side: usize) -> Matrix {
        assert!(
            side >= self.rows && side >= self.cols,
            "cannot pad {}x{} into {}x{}",
            self.rows,
            self.cols,
            side,
            side
        );
        let mut p = Matrix::new(side, side);
        p.set_submatrix(self, 0, 0);
        p
    }

    /// Largest elementwise absolute difference, or `None` if the shapes differ.
    pub fn max_abs_diff(&self, other: &Matrix) -> Option<f32> {
        if self.shape() != other.shape() {
            return None;
        }
        Some(
            self.data
                .iter()
                .zip(other.data.iter())
                .map(|(x, y)| (x - y).abs())
                .fold(0.0f32, f32::max),
        )
    }

    /// Elementwise comparison within an absolute tolerance.
    pub fn approx_eq(&self, other: &Matrix, eps: f32) -> bool {
        match self.max_abs_diff(other) {
            Some(d) => d <= eps,
            None => false,
        }
    }
}

/// Transpose a row-major `rows x cols` buffer into `dst` (`cols x rows`).
pub fn transpose_into(src: &[f32], dst: &mut [f32], rows: usize, cols: usize) {
    for i in 0..rows {
        for j in 0..cols {
            dst[j * rows + i] = src[i * cols + j];
        }
    }
}

/// `out = a + b`, elementwise. All three must share a shape.
pub fn add(a: &Matrix, b: &Matrix, out: &mut Matrix) {
    debug_assert_eq!(a.shape(), b.shape());
    debug_assert_eq!(a.shape(), out.shape());
    for ((o, x), y) in out.data.iter_mut().zip(&a.data).zip(&b.data) {
        *o = x + y;
    }
}

/// `out = a - b`, elementwise. All three must share a shape.
pub fn sub(a: &Matrix, b: &Matrix, out: &mut Matrix) {
    debug_assert_eq!(a.shape(), b.shape());
    debug_assert_eq!(a.shape(), out.shape());
    for ((o, x), y) in out.data.iter_mut().zip(&a.data).zip(&b.data) {
        *o = x - y;
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f32;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f32 {
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f32 {
        &mut self.data[i * self.cols + j]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Matrix[{}x{}]", self.rows, self.cols)
    }
}
