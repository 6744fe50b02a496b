//! Strassen divide-and-conquer multiply.
//!
//! Square operands whose side is above the threshold are split into four
//! quadrants each, seven half-size products are formed recursively, and the
//! four quadrants of the result are assembled from eight additions and
//! subtractions. Blocks at or below the threshold use the naive kernel.
//!
//! Every quadrant, sum and partial product is an owned [`Matrix`]; nothing
//! aliases the caller's operands.

use crate::config::KernelConfig;
use crate::cpu::naive::naive_accumulate;
use crate::error::{MatmulError, Result};
use crate::matrix::{add, sub, Matrix};
use crate::strategy::{check_shapes, store, MatMul, OutputMode};

/// Returns true if `side` stays even at every halving step until it is
/// `<= threshold`.
pub fn halves_cleanly(mut side: usize, threshold: usize) -> bool {
    while side > threshold {
        if side % 2 != 0 {
            return false;
        }
        side /= 2;
    }
    true
}

/// Recursive product of two `n x n` matrices.
///
/// `n` must satisfy [`halves_cleanly`] for `threshold`.
pub fn strassen_square(a: &Matrix, b: &Matrix, threshold: usize) -> Matrix {
    let n = a.rows();
    let mut c = Matrix::new(n, n);
    if n <= threshold {
        naive_accumulate(a.as_slice(), b.as_slice(), c.as_mut_slice(), n, n, n);
        return c;
    }
    let h = n / 2;

    let a11 = a.submatrix(0, 0, h, h);
    let a12 = a.submatrix(0, h, h, h);
    let a21 = a.submatrix(h, 0, h, h);
    let a22 = a.submatrix(h, h, h, h);

    let b11 = b.submatrix(0, 0, h, h);
    let b12 = b.submatrix(0, h, h, h);
    let b21 = b.submatrix(h, 0, h, h);
    let b22 = b.submatrix(h, h, h, h);

    let mut t1 = Matrix::new(h, h);
    let mut t2 = Matrix::new(h, h);

    // M1 = (A11 + A22)(B11 + B22)
    add(&a11, &a22, &mut t1);
    add(&b11, &b22, &mut t2);
    let m1 = strassen_square(&t1, &t2, threshold);
    // M2 = (A21 + A22) B11
    add(&a21, &a22, &mut t1);
    let m2 = strassen_square(&t1, &b11, threshold);
    // M3 = A11 (B12 - B22)
    sub(&b12, &b22, &mut t2);
    let m3 = strassen_square(&a11, &t2, threshold);
    // M4 = A22 (B21 - B11)
    sub(&b21, &b11, &mut t2);
    let m4 = strassen_square(&a22, &t2, threshold);
    // M5 = (A11 + A12) B22
    add(&a11, &a12, &mut t1);
    let m5 = strassen_square(&t1, &b22, threshold);
    // M6 = (A21 - A11)(B11 + B12)
    sub(&a21, &a11, &mut t1);
    add(&b11, &b12, &mut t2);
    let m6 = strassen_square(&t1, &t2, threshold);
    // M7 = (A12 - A22)(B21 + B22)
    sub(&a12, &a22, &mut t1);
    add(&b21, &b22, &mut t2);
    let m7 = strassen_square(&t1, &t2, threshold);

    let mut quad = Matrix::new(h, h);

    // C11 = M1 + M4 - M5 + M7
    add(&m1, &m4, &mut t1);
    sub(&t1, &m5, &mut t2);
    add(&t2, &m7, &mut quad);
    c.set_submatrix(&quad, 0, 0);
    // C12 = M3 + M5
    add(&m3, &m5, &mut quad);
    c.set_submatrix(&quad, 0, h);
    // C21 = M2 + M4
    add(&m2, &m4, &mut quad);
    c.set_submatrix(&quad, h, 0);
    // C22 = M1 - M2 + M3 + M6
    sub(&m1, &m2, &mut t1);
    add(&t1, &m3, &mut t2);
    add(&t2, &m6, &mut quad);
    c.set_submatrix(&quad, h, h);

    c
}

/// Strassen strategy.
///
/// Inputs whose largest dimension is within the threshold go straight to the
/// naive kernel, so the result is bit-identical to [`super::NaiveStrategy`].
/// Larger square inputs recurse directly when their side stays even down to
/// the threshold (see [`halves_cleanly`]), so 96x96 with threshold 64 splits
/// once into 48x48 blocks. Everything else is zero-padded to the next power
/// of two and the product is trimmed back, unless padding is disabled in
/// which case it is rejected.
#[derive(Debug, Clone)]
pub struct StrassenStrategy {
    threshold: usize,
    padding: bool,
}

impl StrassenStrategy {
    pub fn new(config: &KernelConfig) -> Self {
        Self {
            threshold: config.strassen_threshold.max(1),
            padding: config.strassen_padding,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

impl Default for StrassenStrategy {
    fn default() -> Self {
        Self::new(&KernelConfig::default())
    }
}

impl MatMul for StrassenStrategy {
    fn name(&self) -> &str {
        "strassen"
    }

    fn multiply_with(&self, a: &Matrix, b: &Matrix, c: &mut Matrix, mode: OutputMode) -> Result<()> {
        let d = check_shapes(a, b, c)?;
        let largest = d.m.max(d.k).max(d.n);

        if largest <= self.threshold {
            if mode == OutputMode::Overwrite {
                c.zero();
            }
            naive_accumulate(a.as_slice(), b.as_slice(), c.as_mut_slice(), d.m, d.k, d.n);
            return Ok(());
        }

        let conforming = d.m == d.k && d.k == d.n && halves_cleanly(largest, self.threshold);
        if conforming {
            let product = strassen_square(a, b, self.threshold);
            store(c.as_mut_slice(), product.as_slice(), mode);
            return Ok(());
        }

        if !self.padding {
            return Err(MatmulError::Precondition(format!(
                "strassen needs square operands with a power-of-two side, got [{}x{}] @ [{}x{}]",
                d.m, d.k, d.k, d.n
            )));
        }

        let side = largest.next_power_of_two();
        log::debug!(
            "strassen: padding [{}x{}] @ [{}x{}] to {}x{}",
            d.m,
            d.k,
            d.k,
            d.n,
            side,
            side
        );
        let product = strassen_square(&a.padded(side), &b.padded(side), self.threshold);
        let trimmed = product.submatrix(0, 0, d.m, d.n);
        store(c.as_mut_slice(), trimmed.as_slice(), mode);
        Ok(())
    }
}
